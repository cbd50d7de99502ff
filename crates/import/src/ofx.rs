use encoding_rs::WINDOWS_1252;
use ledgerline_core::StatementResult;
use std::borrow::Cow;
use tracing::info;

use crate::assembler::StatementAssembler;
use crate::config::ParseOptions;
use crate::cursor::{CursorEvent, ElementCursor, SourceLocator};
use crate::error::OfxError;
use crate::repair::{repair, strip_header};
use crate::util::re;

re!(re_single_byte_charset,
    r#"(?i)CHARSET:\s*(?:1252|ISO-?8859-1|8859-1)|ENCODING:\s*USASCII|encoding\s*=\s*["'](?:windows-1252|iso-8859-1)["']"#);

/// Bytes inspected for a charset declaration.
const HEADER_SCAN: usize = 1024;

pub struct OfxParser;

impl OfxParser {
    /// Parses already-decoded OFX text into one result per statement.
    pub fn parse(text: &str, options: &ParseOptions) -> Result<Vec<StatementResult>, OfxError> {
        let markup = repair(strip_header(text)?);
        let mut cursor = ElementCursor::new(&markup);
        let mut locator = SourceLocator::new(text);
        let mut results = Vec::new();

        while let Some(event) = cursor.next()? {
            let CursorEvent::Start(start) = event else {
                continue;
            };
            if matches!(start.name.as_str(), "STMTRS" | "CCSTMTRS") {
                let result =
                    StatementAssembler::new(options).assemble(&mut cursor, &start, &mut locator)?;
                results.push(result);
            }
        }

        if results.is_empty() {
            return Err(OfxError::MissingStatement);
        }

        info!(
            statements = results.len(),
            transactions = results.iter().map(|r| r.transactions.len()).sum::<usize>(),
            warnings = results.iter().map(|r| r.warnings.len()).sum::<usize>(),
            strict = options.strict,
            "parsed OFX"
        );
        Ok(results)
    }
}

/// Decodes raw statement bytes: UTF-8 when valid, Windows-1252 when the header
/// declares a single-byte charset, lossy UTF-8 otherwise. Line endings become `\n`.
pub fn decode(raw: &[u8]) -> String {
    let raw = raw.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(raw);
    let text = match std::str::from_utf8(raw) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) if declares_single_byte(raw) => WINDOWS_1252.decode_without_bom_handling(raw).0,
        Err(_) => String::from_utf8_lossy(raw),
    };
    text.replace("\r\n", "\n").replace('\r', "\n")
}

fn declares_single_byte(raw: &[u8]) -> bool {
    let head = String::from_utf8_lossy(&raw[..raw.len().min(HEADER_SCAN)]);
    re_single_byte_charset().is_match(&head)
}

pub fn parse(raw: &[u8], strict: bool) -> Result<Vec<StatementResult>, OfxError> {
    let options = if strict {
        ParseOptions::strict()
    } else {
        ParseOptions::lenient()
    };
    parse_with(raw, &options)
}

pub fn parse_with(raw: &[u8], options: &ParseOptions) -> Result<Vec<StatementResult>, OfxError> {
    OfxParser::parse(&decode(raw), options)
}
