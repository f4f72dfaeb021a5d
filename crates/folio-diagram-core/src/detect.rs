use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// Diagram kind inferred from the source header. Informational only: it drives the status
/// footer and never decides whether a render is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagramType {
    Flowchart,
    Sequence,
    Class,
    State,
    EntityRelationship,
    Gantt,
    Pie,
    #[default]
    Unknown,
}

impl DiagramType {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagramType::Flowchart => "flowchart",
            DiagramType::Sequence => "sequence",
            DiagramType::Class => "class",
            DiagramType::State => "state",
            DiagramType::EntityRelationship => "entity-relationship",
            DiagramType::Gantt => "gantt",
            DiagramType::Pie => "pie",
            DiagramType::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for DiagramType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

struct Detector {
    keywords: &'static [&'static str],
    kind: DiagramType,
}

// Order is significant: the first detector with a keyword present in the header wins.
const DETECTORS: &[Detector] = &[
    Detector {
        keywords: &["flowchart", "graph"],
        kind: DiagramType::Flowchart,
    },
    Detector {
        keywords: &["sequencediagram"],
        kind: DiagramType::Sequence,
    },
    Detector {
        keywords: &["classdiagram"],
        kind: DiagramType::Class,
    },
    Detector {
        keywords: &["statediagram"],
        kind: DiagramType::State,
    },
    Detector {
        keywords: &["erdiagram"],
        kind: DiagramType::EntityRelationship,
    },
    Detector {
        keywords: &["gantt"],
        kind: DiagramType::Gantt,
    },
    Detector {
        keywords: &["pie"],
        kind: DiagramType::Pie,
    },
];

/// Infers the diagram type from the first non-blank line of `source`.
///
/// Matching is case-insensitive and by substring, so `graph TD`, `flowchart LR` and
/// `stateDiagram-v2` are all recognized.
///
/// Front matter is not skipped: a source opening with `---` reports `Unknown` even though
/// [`detect_title`] still reads its `title:` key.
pub fn detect_type(source: &str) -> DiagramType {
    let Some(header) = source.lines().map(str::trim).find(|l| !l.is_empty()) else {
        return DiagramType::Unknown;
    };
    let header = header.to_lowercase();

    DETECTORS
        .iter()
        .find(|det| det.keywords.iter().any(|kw| header.contains(kw)))
        .map(|det| det.kind)
        .unwrap_or(DiagramType::Unknown)
}

fn title_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?imR)^[ \t]*title[ \t]+(\S.*?)[ \t]*$").expect("valid regex"))
}

fn frontmatter_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)^\s*-{3}\s*[\n\r](.*?)[\n\r]-{3}").expect("valid regex"))
}

fn frontmatter_title_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?mR)^[ \t]*title:[ \t]*(\S.*?)[ \t]*$").expect("valid regex"))
}

/// Best-effort title scan.
///
/// Looks for a YAML front-matter `title:` key first, then for the first `title <text>` line
/// anywhere in the body (pie, gantt and several other grammars accept one).
pub fn detect_title(source: &str) -> Option<String> {
    if let Some(front) = frontmatter_regex().captures(source) {
        if let Some(title) = frontmatter_title_regex().captures(&front[1]) {
            return Some(unquote(&title[1]).to_string()).filter(|t| !t.is_empty());
        }
    }

    let caps = title_line_regex().captures(source)?;
    Some(caps[1].to_string())
}

fn unquote(text: &str) -> &str {
    let text = text.trim();
    for q in ['"', '\''] {
        if let Some(inner) = text.strip_prefix(q).and_then(|t| t.strip_suffix(q)) {
            return inner.trim();
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_from_first_line_keywords() {
        assert_eq!(detect_type("flowchart TD\nA-->B"), DiagramType::Flowchart);
        assert_eq!(detect_type("graph LR\nA-->B"), DiagramType::Flowchart);
        assert_eq!(detect_type("sequenceDiagram\nA->>B: hi"), DiagramType::Sequence);
        assert_eq!(detect_type("classDiagram\nclass A"), DiagramType::Class);
        assert_eq!(detect_type("stateDiagram-v2\n[*] --> S"), DiagramType::State);
        assert_eq!(detect_type("erDiagram\nA ||--o{ B : has"), DiagramType::EntityRelationship);
        assert_eq!(detect_type("gantt\ntitle Plan"), DiagramType::Gantt);
        assert_eq!(detect_type("pie title Pets\n\"Dogs\": 3"), DiagramType::Pie);
    }

    #[test]
    fn empty_and_unrecognized_sources_are_unknown() {
        assert_eq!(detect_type(""), DiagramType::Unknown);
        assert_eq!(detect_type("   \n\t\n"), DiagramType::Unknown);
        assert_eq!(detect_type("journey\ntitle My day"), DiagramType::Unknown);
    }

    #[test]
    fn skips_leading_blank_lines_and_ignores_case() {
        assert_eq!(detect_type("\n\n   SEQUENCEDIAGRAM\n"), DiagramType::Sequence);
    }

    #[test]
    fn only_the_header_line_is_inspected() {
        assert_eq!(detect_type("journey\nflowchart"), DiagramType::Unknown);
    }

    #[test]
    fn first_detector_wins_when_several_keywords_match() {
        assert_eq!(detect_type("graph pie"), DiagramType::Flowchart);
    }

    #[test]
    fn title_from_body_line() {
        assert_eq!(
            detect_title("pie\n  title Favourite pets  \n\"Dogs\": 3").as_deref(),
            Some("Favourite pets")
        );
        assert_eq!(detect_title("flowchart TD\nA-->B"), None);
        assert_eq!(detect_title("gantt\ntitle\n"), None);
    }

    #[test]
    fn title_ignores_crlf_line_endings() {
        assert_eq!(
            detect_title("pie\r\ntitle Pets\r\n\"Dogs\": 3\r\n").as_deref(),
            Some("Pets")
        );
        let front = "---\r\ntitle: Release flow\r\n---\r\nflowchart LR\r\nA-->B";
        assert_eq!(detect_title(front).as_deref(), Some("Release flow"));
        assert_eq!(detect_type("pie\r\ntitle Pets"), DiagramType::Pie);
    }

    #[test]
    fn title_from_frontmatter() {
        let src = "---\ntitle: \"Release flow\"\n---\nflowchart LR\nA-->B";
        assert_eq!(detect_title(src).as_deref(), Some("Release flow"));
        // Type detection reads the first non-blank line only, which here is the `---` fence.
        assert_eq!(detect_type(src), DiagramType::Unknown);
    }
}
