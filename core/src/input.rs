use anyhow::{anyhow, Result};

use crate::model::task::{Task, TaskId};

/// Joins free-form command arguments into task text.
pub fn join_words(args: &[String]) -> String {
    args.iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Expands an abbreviation against `candidates`: exact match first, then a
/// unique prefix.
pub fn expand_key<'a>(key: &str, candidates: &[&'a str]) -> Result<&'a str> {
    if let Some(exact) = candidates.iter().find(|&&c| c == key) {
        return Ok(*exact);
    }

    let matches: Vec<&'a str> = candidates
        .iter()
        .filter(|&&c| c.starts_with(key))
        .cloned()
        .collect();

    match matches.len() {
        1 => Ok(matches[0]),
        0 => Err(anyhow!("Unknown key: '{}'", key)),
        _ => Err(anyhow!("Ambiguous key: '{}' matches {:?}", key, matches)),
    }
}

/// Resolves a full id or a unique id prefix (hyphens optional) against the
/// listed tasks.
pub fn resolve_id(input: &str, tasks: &[Task]) -> Result<TaskId> {
    let needle = input.trim().to_lowercase().replace('-', "");
    if needle.is_empty() {
        return Err(anyhow!("An id is required"));
    }

    let keys: Vec<(String, TaskId)> = tasks
        .iter()
        .map(|t| (t.id.to_string().replace('-', ""), t.id))
        .collect();
    let candidates: Vec<&str> = keys.iter().map(|(k, _)| k.as_str()).collect();

    let key = expand_key(&needle, &candidates)
        .map_err(|_| anyhow!("No single todo matches id '{}'", input.trim()))?;
    keys.iter()
        .find(|(k, _)| k == key)
        .map(|(_, id)| *id)
        .ok_or_else(|| anyhow!("No single todo matches id '{}'", input.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::TaskText;

    #[test]
    fn test_join_words() {
        let args = vec!["Buy".to_string(), " ".to_string(), "milk ".to_string()];
        assert_eq!(join_words(&args), "Buy milk");
        assert_eq!(join_words(&[]), "");
    }

    #[test]
    fn test_expand_key() {
        let candidates = vec!["all", "active", "completed"];

        assert_eq!(expand_key("all", &candidates).unwrap(), "all");
        assert_eq!(expand_key("ac", &candidates).unwrap(), "active");
        assert_eq!(expand_key("c", &candidates).unwrap(), "completed");

        // Ambiguous
        assert!(expand_key("a", &candidates).is_err());
        // Unknown
        assert!(expand_key("x", &candidates).is_err());
    }

    #[test]
    fn test_resolve_id() {
        let tasks: Vec<Task> = ["one", "two", "three"]
            .iter()
            .map(|t| Task::new(TaskText::parse(t).unwrap()))
            .collect();
        let target = &tasks[1];

        let full = target.id.to_string();
        assert_eq!(resolve_id(&full, &tasks).unwrap(), target.id);
        assert_eq!(resolve_id(&full.to_uppercase(), &tasks).unwrap(), target.id);
        assert_eq!(resolve_id(&target.id.short(), &tasks).unwrap(), target.id);

        assert!(resolve_id("", &tasks).is_err());
        assert!(resolve_id("zzzz", &tasks).is_err());
        assert!(resolve_id(&full, &[]).is_err());
    }
}
