// src/config/chain.rs

use std::fmt;

/// Separator between commands in a raw chain string.
pub const CHAIN_SEPARATOR: &str = "&&";

/// Ordered, immutable list of commands run for every epoch.
///
/// The `&&` separator does not imply short-circuiting; see
/// [`ChainPolicy`](crate::types::ChainPolicy).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandChain {
    commands: Vec<String>,
}

impl CommandChain {
    /// Build a chain from already separated commands. Blank entries are
    /// dropped and the rest trimmed.
    pub fn new<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let commands = commands
            .into_iter()
            .map(|c| c.as_ref().trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        Self { commands }
    }

    /// Parse a raw `cmd1 && cmd2 && ...` string.
    pub fn parse(raw: &str) -> Self {
        Self::new(raw.split(CHAIN_SEPARATOR))
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().map(String::as_str)
    }
}

impl fmt::Display for CommandChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.commands.join(" && "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_separator_and_trims() {
        let chain = CommandChain::parse("go build &&  ./app -port 8080 ");
        assert_eq!(chain.commands(), ["go build", "./app -port 8080"]);
        assert_eq!(chain.to_string(), "go build && ./app -port 8080");
    }

    #[test]
    fn blank_segments_are_dropped() {
        let chain = CommandChain::parse(" && make &&   && ");
        assert_eq!(chain.len(), 1);
        assert!(CommandChain::parse("   ").is_empty());
    }
}
