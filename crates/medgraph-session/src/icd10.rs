//! ICD-10 codes from graph analyses

use medgraph_domain::Icd10Code;
use medgraph_llm::GraphAnalysis;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

// Dotted codes anywhere (E11.9, I25.10), bare category codes only in parentheses ("(I10)").
const CODE_PATTERN: &str =
    r"\b([A-TV-Z][0-9][0-9AB]\.[0-9A-TV-Z]{1,4})\b|\(([A-TV-Z][0-9][0-9AB])\)";

fn code_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(CODE_PATTERN).ok()).as_ref()
}

/// Codes recognized in free text, in order of first appearance
///
/// Descriptions are left empty.
pub fn scan_codes(text: &str) -> Vec<Icd10Code> {
    let Some(pattern) = code_pattern() else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    pattern
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string())
        .filter(|code| seen.insert(code.clone()))
        .map(|code| Icd10Code::new(code, ""))
        .collect()
}

/// Codes for an analysis: the structured list when it has any, otherwise
/// whatever the free text mentions
pub fn codes_for(analysis: &GraphAnalysis) -> Vec<Icd10Code> {
    match &analysis.structured {
        Some(structured) if !structured.icd10_codes.is_empty() => {
            let mut seen = HashSet::new();
            structured
                .icd10_codes
                .iter()
                .filter(|c| !c.code.trim().is_empty())
                .filter(|c| seen.insert(c.code.trim().to_uppercase()))
                .map(|c| Icd10Code::new(c.code.trim(), c.description.trim()))
                .collect()
        }
        _ => scan_codes(&analysis.analysis),
    }
}
