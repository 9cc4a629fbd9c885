//! Entry-point scoring for process detection.
//!
//! The detector treats this module as opaque: it hands over the candidate's
//! observable signals and gets back `(score, reasons)`. Candidates scoring
//! zero or below are rejected.

/// Observable signals about one Function/Method candidate.
#[derive(Debug, Clone, Copy)]
pub struct EntryPointSignals<'a> {
    pub name: &'a str,
    pub language: &'a str,
    pub is_exported: bool,
    pub caller_count: usize,
    pub callee_count: usize,
    pub file_path: &'a str,
}

/// Name prefixes that suggest a handler or lifecycle entry.
const ENTRY_NAME_PREFIXES: &[&str] = &["handle", "process", "execute", "run", "start", "init"];

/// Name suffixes that suggest a framework-facing class member.
const ENTRY_NAME_SUFFIXES: &[&str] = &["Controller", "Handler", "Listener"];

/// Path fragments that suggest a framework entry layer.
const ENTRY_PATH_FRAGMENTS: &[&str] =
    &["/routes/", "/controllers/", "/handlers/", "/api/", "/cmd/", "/bin/"];

/// Score a candidate entry point. Higher is better; `<= 0` means rejected.
///
/// Every contribution appends a reason string so downstream consumers can
/// see why a candidate ranked where it did.
pub fn score_entry_point(signals: &EntryPointSignals) -> (f32, Vec<String>) {
    let mut score = 0.0f32;
    let mut reasons = Vec::new();

    if signals.is_exported {
        score += 2.0;
        reasons.push("exported symbol".to_owned());
    }

    if signals.caller_count == 0 {
        score += 3.0;
        reasons.push("no internal callers".to_owned());
    }

    if signals.name == "main" {
        score += 3.0;
        reasons.push("program entry name".to_owned());
    } else if has_entry_prefix(signals.name) {
        score += 2.0;
        reasons.push("handler-style name".to_owned());
    } else if is_event_callback_name(signals.name) {
        score += 2.0;
        reasons.push("event-callback name".to_owned());
    } else if ENTRY_NAME_SUFFIXES.iter().any(|s| signals.name.ends_with(s)) {
        score += 2.0;
        reasons.push("controller-style name".to_owned());
    }

    // A symbol that calls out far more than it is called in looks like the
    // top of a flow rather than a shared utility.
    if signals.callee_count >= 3 * signals.caller_count.max(1) {
        score += 1.0;
        reasons.push("high callee/caller ratio".to_owned());
    }

    let path = signals.file_path;
    if ENTRY_PATH_FRAGMENTS.iter().any(|frag| path.contains(frag)) {
        score += 1.5;
        reasons.push("framework entry path".to_owned());
    }

    // Heavily-called internal utilities are poor process starts.
    if signals.caller_count > 5 {
        score -= 2.0;
        reasons.push("widely called internally".to_owned());
    }

    (score, reasons)
}

/// `handleRequest`, `process_batch`, `runJob` and friends. The prefix must
/// end at a word boundary (case change or underscore) so `handler` alone
/// does not match, but a bare `run`/`start` does.
fn has_entry_prefix(name: &str) -> bool {
    ENTRY_NAME_PREFIXES.iter().any(|prefix| {
        name.strip_prefix(prefix).is_some_and(|rest| {
            rest.is_empty() || rest.starts_with('_') || rest.chars().next().is_some_and(char::is_uppercase)
        })
    })
}

/// `onClick`, `on_message`: an `on` prefix followed by a new word.
fn is_event_callback_name(name: &str) -> bool {
    name.strip_prefix("on").is_some_and(|rest| {
        rest.starts_with('_') || rest.chars().next().is_some_and(char::is_uppercase)
    })
}
