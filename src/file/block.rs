use std::fmt;

/// Identity of one fixed-size block of a file
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlockId {
    file_name: String,
    number: usize,
}

impl BlockId {
    pub fn new(file_name: impl Into<String>, number: usize) -> Self {
        Self {
            file_name: file_name.into(),
            number,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn number(&self) -> usize {
        self.number
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[file {}, block {}]", self.file_name, self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_block_identity() {
        let a = BlockId::new("data.tbl", 3);
        let b = BlockId::new(String::from("data.tbl"), 3);
        let c = BlockId::new("data.tbl", 4);
        let d = BlockId::new("other.tbl", 3);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);

        let set: HashSet<BlockId> = [a, b, c, d].into_iter().collect();
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            BlockId::new("coredb.log", 7).to_string(),
            "[file coredb.log, block 7]"
        );
    }
}
