//! Content validation
//!
//! Pure classification of upload bytes. Two layers:
//!
//! * an allowlist classifier ([`classify`]) used by the ingestion worker:
//!   recognizes a handful of safe formats by magic number and falls back to
//!   a printable-text heuristic. It catches obviously-binary or unexpected
//!   payloads; it is not a content-type verifier.
//! * a denylist ([`has_executable_signature`], [`has_disallowed_extension`])
//!   applied at the submission boundary before a job is ever created,
//!   regardless of what the classifier would say.
//!
//! Both are deterministic and look only at bytes and the declared name,
//! never at a content-type header.

/// Classifier verdict for a byte buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject,
}

/// Magic-number prefixes recognized as safe: PDF, JPEG, PNG, GIF, ZIP.
const SAFE_MAGIC_PREFIXES: &[&[u8]] = &[
    b"%PDF-",
    &[0xFF, 0xD8, 0xFF],
    &[0x89, 0x50, 0x4E, 0x47],
    b"GIF87a",
    b"GIF89a",
    &[0x50, 0x4B, 0x03, 0x04],
];

/// Extensions rejected at the submission boundary.
const DISALLOWED_EXTENSIONS: &[&str] =
    &["exe", "dll", "bat", "cmd", "msi", "ps1", "sh", "jar"];

/// How many leading bytes the printable-text heuristic samples.
const TEXT_SAMPLE_SIZE: usize = 100;

/// Fraction of sampled bytes that must be printable ASCII for a buffer with
/// no recognized magic number to pass as plausible text.
const PRINTABLE_THRESHOLD: f64 = 0.8;

/// Classify a buffer as a known-safe format or plausible text.
///
/// Buffers shorter than 4 bytes carry too little to classify and are
/// rejected outright.
pub fn classify(content: &[u8]) -> Verdict {
    if content.len() < 4 {
        return Verdict::Reject;
    }

    if SAFE_MAGIC_PREFIXES
        .iter()
        .any(|prefix| content.starts_with(prefix))
    {
        return Verdict::Accept;
    }

    let sample = &content[..content.len().min(TEXT_SAMPLE_SIZE)];
    let printable = sample.iter().filter(|&&b| (32..=126).contains(&b)).count();
    if printable as f64 / sample.len() as f64 > PRINTABLE_THRESHOLD {
        return Verdict::Accept;
    }

    Verdict::Reject
}

/// Whether the buffer starts with the native-executable signature `MZ`.
///
/// Known heuristic: catches PE binaries only; other executable formats slip
/// through and are left to the allowlist classifier.
pub fn has_executable_signature(content: &[u8]) -> bool {
    content.len() >= 2 && content[0] == 0x4D && content[1] == 0x5A
}

/// Whether the declared name carries a denylisted extension.
pub fn has_disallowed_extension(filename: &str) -> bool {
    let extension = filename.rsplit('.').next().unwrap_or("").to_lowercase();
    filename.contains('.') && DISALLOWED_EXTENSIONS.contains(&extension.as_str())
}

/// Sanitize a client-supplied filename for display and name derivation.
///
/// Takes the final path component and maps every character that is not
/// alphanumeric, `.`, `-`, or `_` to `_`. The result is never trusted for path
/// construction; storage derives its own name from it.
pub fn sanitize_filename(filename: &str) -> String {
    const MAX_FILENAME_LENGTH: usize = 255;

    let filename_only = std::path::Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    let sanitized: String = filename_only
        .chars()
        .take(MAX_FILENAME_LENGTH)
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.chars().all(|c| c == '.' || c == '_') {
        return "unnamed_file".to_string();
    }

    sanitized
}
