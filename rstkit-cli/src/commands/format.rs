//! Format command implementation.

use anyhow::{Context, Result};
use rstkit_core::{Fields, FragmentKind};

/// Format one fragment and print it verbatim.
pub fn format_fragment(kind: &str, fields_json: &str) -> Result<()> {
    let fields = parse_fields(fields_json)?;
    print!("{}", rstkit_core::format(kind, &fields));
    Ok(())
}

pub fn list_kinds() {
    for kind in FragmentKind::ALL {
        println!("{kind}");
    }
}

fn parse_fields(json: &str) -> Result<Fields> {
    serde_json::from_str(json).context("--fields must be a JSON object")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fields_requires_object() {
        assert!(parse_fields(r#"{"text": "x"}"#).is_ok());
        assert!(parse_fields("[]").is_err());
        assert!(parse_fields("not json").is_err());
    }
}
