use anyhow::Result;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Parse `KEY=value` lines; blank lines and `#` comments are skipped, surrounding
/// quotes are removed. Lines without `=` are reported and ignored.
pub fn parse_env_text(content: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for (idx, line) in content.lines().enumerate() {
        let s = line.trim();
        if s.is_empty() || s.starts_with('#') {
            continue;
        }
        if let Some(eq) = s.find('=') {
            let key = s[..eq].trim();
            let mut val = s[eq + 1..].trim().to_string();
            if val.len() >= 2
                && ((val.starts_with('"') && val.ends_with('"'))
                    || (val.starts_with('\'') && val.ends_with('\'')))
            {
                val = val[1..val.len() - 1].to_string();
            }
            map.insert(key.to_string(), val);
        } else {
            log::warn!("Ignoring .env line {} without '=': {}", idx + 1, line);
        }
    }
    map
}

/// Load a .env file into the process environment without overriding existing variables.
/// A missing file is not an error.
pub fn load_env_file_from(path: &Path) -> Result<HashMap<String, String>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let content = fs::read_to_string(path)?;
    let map = parse_env_text(&content);
    for (k, v) in &map {
        if std::env::var_os(k).is_none() {
            unsafe {
                std::env::set_var(k, v);
            }
        }
    }
    Ok(map)
}

/// Load `.env` from the current working directory, if present.
pub fn load_dotenv_if_present() -> Result<()> {
    load_env_file_from(Path::new(".env")).map(|_| ())
}

/// Generate a .env.template file with the recognised variables commented out.
pub fn write_env_template(path: &Path) -> Result<()> {
    let mut f = fs::File::create(path)?;
    let template = r#"# place_merge environment configuration template
# Copy this file to .env and uncomment what you need.
# Any of these variables can also be provided via the system environment
# or overridden on the command line.

# Inputs and output of `place_merge merge`
#PLACE_MERGE_LEGACY=public/data_files/1790-2010_MASTER.csv
#PLACE_MERGE_SNAPSHOT=public/data_files/us2021census.csv
#PLACE_MERGE_OUT=public/data_files/us_city_populations_1790-2020.csv
#PLACE_MERGE_SUMMARY=public/data_files/merge_summary.csv

# Matching policy
#PLACE_MERGE_SNAPSHOT_YEAR=2020
#PLACE_MERGE_APPEND_THRESHOLD=2500
#PLACE_MERGE_PROGRESS_EVERY=1000
#PLACE_MERGE_TITLE_CASE=true

# `place_merge cdps`
#PLACE_MERGE_CENSUS_URL=https://api.census.gov/data/2020/dec/pl?get=NAME,P1_001N&for=place:*&in=state:*
#PLACE_MERGE_CDP_MIN_POP=25000
#PLACE_MERGE_CDP_OUT=cdps_over_25k_2020.csv

# Logging
#RUST_LOG=info
"#;
    f.write_all(template.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pairs_and_quotes() {
        let map = parse_env_text(
            "# comment\n\nPLACE_MERGE_OUT=\"out.csv\"\nPLACE_MERGE_SNAPSHOT_YEAR = 2020\nbogus line\nX='y'\n",
        );
        assert_eq!(map.get("PLACE_MERGE_OUT").map(String::as_str), Some("out.csv"));
        assert_eq!(
            map.get("PLACE_MERGE_SNAPSHOT_YEAR").map(String::as_str),
            Some("2020")
        );
        assert_eq!(map.get("X").map(String::as_str), Some("y"));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn single_quote_char_kept() {
        let map = parse_env_text("A=\"\n");
        assert_eq!(map.get("A").map(String::as_str), Some("\""));
    }

    #[test]
    fn missing_file_is_empty() {
        let map = load_env_file_from(Path::new("/nonexistent/.env")).unwrap();
        assert!(map.is_empty());
    }
}
