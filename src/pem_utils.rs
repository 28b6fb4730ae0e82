const BEGIN_MARKER: &str = "-----BEGIN ";
const END_MARKER: &str = "-----END ";
const MARKER_CLOSE: &str = "-----";

/// Convert DER‑encoded data into a PEM‑encoded string with the provided label.
pub fn der_to_pem(der: &[u8], label: &str) -> String {
    let pem = pem::Pem::new(label, der);
    pem::encode_config(&pem, pem::EncodeConfig::new().set_line_ending(pem::LineEnding::LF))
}

/// Parse a string that must consist of exactly one PEM block.
///
/// Surrounding ASCII whitespace is allowed. Any other text before the
/// `BEGIN` line or after the `END` line, including a second block, is
/// rejected with a message describing what was found.
pub fn parse_single_block(input: &str) -> Result<pem::Pem, String> {
    let body = input.trim_matches(|c: char| c.is_ascii_whitespace());
    if body.is_empty() {
        return Err("no PEM block found".to_string());
    }
    if !body.starts_with(BEGIN_MARKER) {
        return Err("invalid crl; unexpected data before PEM block".to_string());
    }

    let end = body
        .find(END_MARKER)
        .ok_or_else(|| "invalid crl; PEM block is not terminated".to_string())?;
    let close = body[end + END_MARKER.len()..]
        .find(MARKER_CLOSE)
        .ok_or_else(|| "invalid crl; PEM block is not terminated".to_string())?;
    let block_end = end + END_MARKER.len() + close + MARKER_CLOSE.len();

    if block_end != body.len() {
        return Err("invalid crl; should be one PEM block only".to_string());
    }

    pem::parse(body).map_err(|e| e.to_string())
}

/// Convert a PEM‑encoded string to DER‑encoded bytes.
pub fn pem_to_der(pem_str: &str) -> Result<Vec<u8>, pem::PemError> {
    let pem = pem::parse(pem_str)?;
    Ok(pem.contents().to_vec())
}
