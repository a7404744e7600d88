// Copyright 2025 Apache Doris Community
// Licensed under the Apache License, Version 2.0

//! Version information

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const GIT_COMMIT: &str = env!("REFQ_GIT_SHA");
pub const BUILD_TIME: &str = env!("REFQ_BUILD_TIMESTAMP");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_metadata_is_stamped() {
        assert_eq!(VERSION, "0.1.0");
        assert!(!GIT_COMMIT.is_empty());
        assert!(BUILD_TIME.contains('T'));
    }
}
