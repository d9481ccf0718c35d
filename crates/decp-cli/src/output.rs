use serde::Serialize;

use crate::cli::OutputFormat;

/// Render a serializable response to a string in the requested format.
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Raw => Ok(serde_json::to_string(value)?),
    }
}

/// Print a serializable response in the requested format.
pub fn output<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    let rendered = render(value, format)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use decp_core::responses::CpvImportReport;
    use pretty_assertions::assert_eq;

    #[test]
    fn raw_is_single_line() {
        let report = CpvImportReport { codes: 9454 };
        assert_eq!(render(&report, OutputFormat::Raw).unwrap(), r#"{"codes":9454}"#);
        assert_eq!(
            render(&report, OutputFormat::Json).unwrap(),
            "{\n  \"codes\": 9454\n}"
        );
    }
}
