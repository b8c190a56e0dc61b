//! `pipeconv platforms` - List supported platforms

use pipeconv::Platform;

fn mark(supported: bool) -> &'static str {
    if supported { "yes" } else { "-" }
}

pub fn platform_table() -> String {
    let mut table = format!(
        "{:<10} {:<20} {:<6} {:<8} {}\n",
        "NAME", "PLATFORM", "PARSE", "GENERATE", "DEFAULT PATH"
    );
    for platform in Platform::ALL {
        table.push_str(&format!(
            "{:<10} {:<20} {:<6} {:<8} {}\n",
            platform.as_str(),
            platform.display_name(),
            mark(platform.can_parse()),
            mark(platform.can_generate()),
            platform.default_output_path()
        ));
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_lists_every_platform() {
        let table = platform_table();
        assert_eq!(table.lines().count(), Platform::ALL.len() + 1);
        let bitbucket = table.lines().find(|l| l.starts_with("bitbucket")).unwrap();
        assert!(bitbucket.contains("bitbucket-pipelines.yml"));
        assert!(!bitbucket.contains("yes"));
    }
}
