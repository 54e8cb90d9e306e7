//! Report section extraction and splicing
//!
//! A report is a sequence of sections, each introduced by a header line: a
//! line whose trimmed content is an all-caps label from the header
//! vocabulary, optionally followed by a colon. Text before the first header
//! forms an implicit preamble.
//!
//! Both operations scan the original text once into line spans and work on
//! byte ranges of that text. A splice never re-parses text that contains the
//! replacement body, so header-like lines inside a new body cannot move the
//! boundaries of any other section.

use serde::Serialize;

use crate::error::SpliceError;
use crate::vocabulary::{self, Language, SectionKind, normalize_label};

/// One line of the source text as byte offsets
#[derive(Debug, Clone, Copy)]
struct Line {
    start: usize,
    /// End of content, excluding the line terminator (and a trailing `\r`)
    end: usize,
    /// Start of the following line
    next: usize,
}

impl Line {
    fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }

    fn is_blank(&self, source: &str) -> bool {
        self.text(source).trim().is_empty()
    }
}

fn scan(text: &str) -> Vec<Line> {
    let bytes = text.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let (end, next) = match text[start..].find('\n') {
            Some(offset) => (start + offset, start + offset + 1),
            None => (text.len(), text.len()),
        };
        let end = if end > start && bytes[end - 1] == b'\r' {
            end - 1
        } else {
            end
        };
        lines.push(Line { start, end, next });
        start = next;
    }

    lines
}

/// A section of a parsed report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section<'a> {
    /// Header line as written, trimmed; `None` for the preamble
    pub header: Option<&'a str>,
    /// Vocabulary entry the header belongs to
    pub kind: Option<SectionKind>,
    pub language: Option<Language>,
    /// Body with leading and trailing blank lines removed
    pub body: &'a str,
}

/// Parse a report into its ordered sections.
///
/// Only vocabulary labels written in capitals start a section. A preamble
/// section is emitted first when there is non-blank text before the first
/// header.
pub fn outline(text: &str) -> Vec<Section<'_>> {
    let lines = scan(text);
    let headers: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| is_boundary(line.text(text), None))
        .map(|(idx, _)| idx)
        .collect();

    let mut sections = Vec::with_capacity(headers.len() + 1);

    let preamble_end = headers
        .first()
        .map(|&idx| lines[idx].start)
        .unwrap_or(text.len());
    let preamble = normalize_body(&text[..preamble_end]);
    if !preamble.is_empty() {
        sections.push(Section {
            header: None,
            kind: None,
            language: None,
            body: preamble,
        });
    }

    for (pos, &idx) in headers.iter().enumerate() {
        let header = lines[idx];
        let body_end = headers
            .get(pos + 1)
            .map(|&next| lines[next].start)
            .unwrap_or(text.len());
        let label = header.text(text).trim();
        let resolved = vocabulary::kind_of(label);

        sections.push(Section {
            header: Some(label),
            kind: resolved.map(|(kind, _)| kind),
            language: resolved.map(|(_, lang)| lang),
            body: normalize_body(&text[header.next.min(body_end)..body_end]),
        });
    }

    sections
}

/// Body of the first section headed `header`, or `None` when the report has
/// no such section.
///
/// The header is matched case-insensitively, with or without a trailing
/// colon. The body runs until the next header line or the end of the text.
pub fn extract<'a>(report: &'a str, header: &str) -> Option<&'a str> {
    let label = parse_header_name(header).ok()?;
    let lines = scan(report);
    locate(report, &lines, &label).map(|found| found.body(report))
}

/// Replace the body of the first section headed `header`, or append the
/// section when it is missing.
///
/// The header line and body of an existing section become
/// `"{header}:\n{new_body}"`; everything before and after that span,
/// including blank lines between sections, is kept byte for byte. When the
/// section already holds `new_body` the input is returned unchanged.
///
/// Fails only when `header` is not a usable header name, in which case
/// nothing is produced and the caller keeps its text.
pub fn splice(report: &str, header: &str, new_body: &str) -> Result<String, SpliceError> {
    let label = parse_header_name(header)?;
    let new_body = normalize_body(new_body);
    let lines = scan(report);

    let Some(found) = locate(report, &lines, &label) else {
        let prior = report.trim_end();
        if prior.is_empty() {
            return Ok(format!("{label}:\n{new_body}"));
        }
        return Ok(format!("{prior}\n\n{label}:\n{new_body}"));
    };

    if found.holds(report, &label, new_body) {
        return Ok(report.to_string());
    }

    let head = &report[..found.header.start];
    let tail = &report[found.span_end()..];
    let mut spliced =
        String::with_capacity(head.len() + label.len() + new_body.len() + tail.len() + 2);
    spliced.push_str(head);
    spliced.push_str(&label);
    spliced.push_str(":\n");
    spliced.push_str(new_body);
    spliced.push_str(tail);

    Ok(spliced)
}

/// Header line plus the extent of its body
struct Located {
    header: Line,
    /// End of the last non-blank body line
    content_end: Option<usize>,
}

impl Located {
    fn span_end(&self) -> usize {
        self.content_end.unwrap_or(self.header.end)
    }

    fn body<'a>(&self, source: &'a str) -> &'a str {
        match self.content_end {
            Some(end) => normalize_body(&source[self.header.next..end]),
            None => "",
        }
    }

    /// Whether the text right after the header already reads `body` and the
    /// section ends there.
    ///
    /// The parsed body alone is not enough: a body containing a vocabulary
    /// header line is cut short by the parse even when it is exactly the
    /// text a previous splice wrote.
    fn holds(&self, source: &str, label: &str, body: &str) -> bool {
        if self.body(source) == body {
            return true;
        }
        if body.is_empty() {
            return false;
        }

        let after_header = &source[self.header.next.min(source.len())..];
        let rest = &after_header[leading_blank_len(after_header)..];
        match rest.strip_prefix(body) {
            Some(tail) => ends_section(tail, label),
            None => false,
        }
    }
}

fn locate(text: &str, lines: &[Line], label: &str) -> Option<Located> {
    let target = vocabulary::kind_of(label);
    let idx = lines
        .iter()
        .position(|line| names_header(line.text(text), label, target))?;
    let header = lines[idx];

    let mut content_end = None;
    for line in &lines[idx + 1..] {
        let content = line.text(text);
        if is_boundary(content, Some(label)) {
            break;
        }
        if !line.is_blank(text) {
            content_end = Some(line.start + content.trim_end().len());
        }
    }

    Some(Located {
        header,
        content_end,
    })
}

/// `tail` starts where a body ended: the rest of that line is blank and the
/// next non-blank line, if any, is a header.
fn ends_section(tail: &str, label: &str) -> bool {
    let lines = scan(tail);
    let Some((first, rest)) = lines.split_first() else {
        return true;
    };
    if !first.is_blank(tail) {
        return false;
    }
    rest.iter()
        .find(|line| !line.is_blank(tail))
        .is_none_or(|line| is_boundary(line.text(tail), Some(label)))
}

/// Case-insensitive match of a whole line against a header label. A
/// vocabulary label also matches every other spelling of its header.
fn names_header(line: &str, label: &str, target: Option<(SectionKind, Language)>) -> bool {
    let candidate = normalize_label(line);
    if candidate.is_empty() {
        return false;
    }
    candidate.to_uppercase() == label.to_uppercase()
        || target.is_some_and(|wanted| vocabulary::kind_of(&candidate) == Some(wanted))
}

/// Whether a line starts a new section.
///
/// The line must be written in capitals and name a vocabulary header, or
/// the header currently being looked up.
fn is_boundary(line: &str, target: Option<&str>) -> bool {
    let candidate = normalize_label(line);
    if !is_caps_label(&candidate) {
        return false;
    }
    vocabulary::kind_of(&candidate).is_some()
        || target.is_some_and(|label| candidate == label.to_uppercase())
}

fn is_caps_label(candidate: &str) -> bool {
    candidate.chars().any(char::is_alphabetic)
        && candidate
            .chars()
            .all(|c| c == ' ' || (c.is_alphabetic() && !c.is_lowercase()))
}

fn parse_header_name(header: &str) -> Result<String, SpliceError> {
    if header.contains(['\n', '\r']) {
        return Err(SpliceError::InvalidHeader(header.trim().to_string()));
    }
    let label = normalize_label(header);
    if label.is_empty() {
        return Err(SpliceError::EmptyHeader);
    }
    if !label.chars().all(|c| c.is_alphabetic() || c == ' ') {
        return Err(SpliceError::InvalidHeader(header.trim().to_string()));
    }
    Ok(label)
}

/// Drop leading blank lines and trailing whitespace
fn normalize_body(body: &str) -> &str {
    body[leading_blank_len(body)..].trim_end()
}

fn leading_blank_len(text: &str) -> usize {
    let mut len = 0;
    for line in text.split_inclusive('\n') {
        if !line.trim().is_empty() || !line.ends_with('\n') {
            break;
        }
        len += line.len();
    }
    len
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO_A: &str = "FINDINGS:\nMass noted.\n\nRECOMMENDATION:\nFollow-up in 6 months.";

    const FULL_REPORT: &str = "ULTRASOUND REPORT\n\nPatient ID: TCGA_CS_4941\nPatient Age: 52 years\nReport Date: 03.02.2026\n\nClinical History:\nPalpable mass in the right breast.\n\nFINDINGS:\nAn oval, circumscribed, hypoechoic mass at 12 o'clock.\n\nIt measures 15 mm.\n\nIMPRESSION:\nBI-RADS 3: Probably benign.\n\nRECOMMENDATION:\nShort-interval follow-up ultrasound in 6 months.\n";

    const GERMAN_REPORT: &str = "ULTRASCHALLBEFUND\n\nPatienten-ID: TCGA_CS_4941\n\nBEFUND:\nOvale, umschriebene Raumforderung.\n\nEINDRUCK:\nBI-RADS 3.\n\nEMPFEHLUNG:\nKontrolle in 6 Monaten.";

    fn reports() -> Vec<&'static str> {
        vec![
            "",
            "   \n",
            SCENARIO_A,
            "FINDINGS:\nNo mass.",
            FULL_REPORT,
            GERMAN_REPORT,
            "FINDINGS:\r\nMass.\r\n\r\nRECOMMENDATION:\r\nBiopsy.\r\n\r\nIMPRESSION:\r\nBI-RADS 4.\r\n",
            "Recommendation\nLowercase header without colon.\n\nIMPRESSION:\nNormal.",
        ]
    }

    fn bodies() -> Vec<&'static str> {
        vec![
            "Biopsy recommended.",
            "",
            "Line one.\n\nLine two after a blank line.",
            "THIS IS NOT A HEADER\nContinue screening.",
            "Follow-up.\nIMPRESSION:\nThis looks like a header.",
        ]
    }

    #[test]
    fn scenario_a_extracts_recommendation() {
        assert_eq!(
            extract(SCENARIO_A, "RECOMMENDATION"),
            Some("Follow-up in 6 months.")
        );
        assert_eq!(extract(SCENARIO_A, "FINDINGS"), Some("Mass noted."));
    }

    #[test]
    fn scenario_b_replaces_only_the_recommendation() {
        let spliced = splice(SCENARIO_A, "RECOMMENDATION", "Biopsy recommended.").unwrap();
        assert_eq!(
            spliced,
            "FINDINGS:\nMass noted.\n\nRECOMMENDATION:\nBiopsy recommended."
        );
        assert_eq!(extract(&spliced, "FINDINGS"), Some("Mass noted."));
    }

    #[test]
    fn scenario_c_appends_missing_section() {
        let spliced = splice("FINDINGS:\nNo mass.", "RECOMMENDATION", "Routine screening.").unwrap();
        assert_eq!(
            spliced,
            "FINDINGS:\nNo mass.\n\nRECOMMENDATION:\nRoutine screening."
        );
    }

    #[test]
    fn scenario_d_empty_report_has_no_leading_blank_lines() {
        assert_eq!(splice("", "RECOMMENDATION", "X").unwrap(), "RECOMMENDATION:\nX");
        assert_eq!(
            splice(" \n\n", "RECOMMENDATION", "X").unwrap(),
            "RECOMMENDATION:\nX"
        );
    }

    #[test]
    fn splice_is_idempotent() {
        for report in reports() {
            for body in bodies() {
                let once = splice(report, "RECOMMENDATION", body).unwrap();
                let twice = splice(&once, "RECOMMENDATION", body).unwrap();
                assert_eq!(once, twice, "report {report:?} body {body:?}");
            }
        }
    }

    #[test]
    fn resplicing_the_current_body_returns_input_verbatim() {
        let report = "FINDINGS:\nMass.\n\nrecommendation\n\nFollow-up in 6 months.\n\n\n";
        let same = splice(report, "RECOMMENDATION", "Follow-up in 6 months.").unwrap();
        assert_eq!(same, report);
    }

    #[test]
    fn splice_preserves_other_sections() {
        let spliced = splice(FULL_REPORT, "FINDINGS", "Replaced findings.\nIMPRESSION:\nfake").unwrap();

        let before = outline(FULL_REPORT);
        let after = outline(&spliced);
        for section in &before {
            if section.kind == Some(SectionKind::Findings) {
                continue;
            }
            assert!(
                after.iter().any(|s| s.header == section.header && s.body == section.body),
                "section {:?} changed",
                section.header
            );
        }

        let findings_at = FULL_REPORT.find("FINDINGS:").unwrap();
        assert_eq!(&spliced[..findings_at], &FULL_REPORT[..findings_at]);
        assert!(spliced.ends_with(
            "\n\nIMPRESSION:\nBI-RADS 3: Probably benign.\n\nRECOMMENDATION:\nShort-interval follow-up ultrasound in 6 months.\n"
        ));
    }

    #[test]
    fn extract_after_splice_round_trips() {
        for report in reports() {
            for body in bodies().into_iter().filter(|b| !b.contains("IMPRESSION")) {
                let spliced = splice(report, "RECOMMENDATION", body).unwrap();
                assert_eq!(
                    extract(&spliced, "RECOMMENDATION"),
                    Some(body),
                    "report {report:?} body {body:?}"
                );
            }
        }
    }

    #[test]
    fn prose_lines_are_not_boundaries() {
        let report = "RECOMMENDATION:\nTHIS IS NOT A HEADER\nBiopsy.\nFindings:\nsee above";
        assert_eq!(
            extract(report, "RECOMMENDATION"),
            Some("THIS IS NOT A HEADER\nBiopsy.\nFindings:\nsee above")
        );

        let prose = "FINDINGS:\nThe IMPRESSION: is unchanged.\n\nIMPRESSION:\nBenign.";
        assert_eq!(
            extract(prose, "FINDINGS"),
            Some("The IMPRESSION: is unchanged.")
        );
    }

    #[test]
    fn append_separates_with_one_blank_line() {
        let spliced = splice("FINDINGS:\nNo mass.\n\n\n", "RECOMMENDATION", "Screening.").unwrap();
        assert_eq!(spliced, "FINDINGS:\nNo mass.\n\nRECOMMENDATION:\nScreening.");
        assert!(spliced.starts_with("FINDINGS:\nNo mass."));
    }

    #[test]
    fn header_matching_is_tolerant() {
        assert_eq!(
            extract("  Recommendation :  \nBiopsy.", "RECOMMENDATION:"),
            Some("Biopsy.")
        );
        assert_eq!(extract("RECOMMENDATION\nBiopsy.", "recommendation"), Some("Biopsy."));
        assert_eq!(extract("FINDINGS:\nNo mass.", "RECOMMENDATION"), None);
    }

    #[test]
    fn empty_body_between_headers() {
        let report = "IMPRESSION:\nRECOMMENDATION:\nBiopsy.";
        assert_eq!(extract(report, "IMPRESSION"), Some(""));

        let spliced = splice(report, "IMPRESSION", "BI-RADS 4.").unwrap();
        assert_eq!(spliced, "IMPRESSION:\nBI-RADS 4.\nRECOMMENDATION:\nBiopsy.");
    }

    #[test]
    fn duplicate_headers_use_first_occurrence() {
        let report = "RECOMMENDATION:\nFirst.\n\nRECOMMENDATION:\nSecond.";
        assert_eq!(extract(report, "RECOMMENDATION"), Some("First."));

        let spliced = splice(report, "RECOMMENDATION", "Changed.").unwrap();
        assert_eq!(spliced, "RECOMMENDATION:\nChanged.\n\nRECOMMENDATION:\nSecond.");
    }

    #[test]
    fn crlf_reports_keep_their_line_endings() {
        let report = "FINDINGS:\r\nMass.\r\n\r\nRECOMMENDATION:\r\nBiopsy.\r\n";
        assert_eq!(extract(report, "FINDINGS"), Some("Mass."));

        let spliced = splice(report, "FINDINGS", "No mass.").unwrap();
        assert_eq!(spliced, "FINDINGS:\nNo mass.\r\n\r\nRECOMMENDATION:\r\nBiopsy.\r\n");
    }

    #[test]
    fn invalid_header_names_are_rejected() {
        assert_eq!(splice(SCENARIO_A, "  : ", "x"), Err(SpliceError::EmptyHeader));
        assert!(matches!(
            splice(SCENARIO_A, "RECOMMENDATION\nFINDINGS", "x"),
            Err(SpliceError::InvalidHeader(_))
        ));
        assert_eq!(extract(SCENARIO_A, "FIND.*"), None);
    }

    #[test]
    fn german_headers_and_alias() {
        assert_eq!(
            extract(GERMAN_REPORT, "EMPFEHLUNG"),
            Some("Kontrolle in 6 Monaten.")
        );
        let legacy = "BEFUND:\nKeine Raumforderung.\n\nEMPFHEHLUNG:\nScreening.";
        assert_eq!(extract(legacy, "BEFUND"), Some("Keine Raumforderung."));
        assert_eq!(extract(legacy, "EMPFEHLUNG"), Some("Screening."));
    }

    #[test]
    fn alias_header_is_replaced_in_place() {
        let legacy = "BEFUND:\nKeine Raumforderung.\n\nEMPFHEHLUNG:\nScreening.\n\nEINDRUCK:\nBI-RADS 1.";
        let spliced = splice(legacy, "EMPFEHLUNG", "Biopsie.").unwrap();
        assert_eq!(
            spliced,
            "BEFUND:\nKeine Raumforderung.\n\nEMPFEHLUNG:\nBiopsie.\n\nEINDRUCK:\nBI-RADS 1."
        );
        assert_eq!(splice(&spliced, "EMPFEHLUNG", "Biopsie.").unwrap(), spliced);

        // Unchanged body keeps the original spelling
        assert_eq!(splice(legacy, "EMPFEHLUNG", "Screening.").unwrap(), legacy);

        // Same kind in the other language is a different header
        assert_eq!(extract(legacy, "RECOMMENDATION"), None);
    }

    #[test]
    fn outline_lists_sections_in_order() {
        let sections = outline(FULL_REPORT);
        let kinds: Vec<_> = sections.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                Some(SectionKind::Title),
                Some(SectionKind::Findings),
                Some(SectionKind::Impression),
                Some(SectionKind::Recommendation),
            ]
        );
        assert!(sections[0].body.starts_with("Patient ID: TCGA_CS_4941"));
        assert!(sections[0].body.ends_with("Palpable mass in the right breast."));
        assert_eq!(
            sections[1].body,
            "An oval, circumscribed, hypoechoic mass at 12 o'clock.\n\nIt measures 15 mm."
        );
    }

    #[test]
    fn outline_keeps_preamble() {
        let sections = outline("Here is the report\n\nFINDINGS:\nNo mass.");
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].header, None);
        assert_eq!(sections[0].body, "Here is the report");
        assert_eq!(sections[1].language, Some(Language::English));
    }
}
