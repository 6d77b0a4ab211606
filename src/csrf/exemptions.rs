// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Paths excluded from CSRF protection.

/// Exact-match path exemptions.
///
/// Sorted and de-duplicated on construction, so lookups by binary search
/// stay correct whatever order the paths were configured in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsrfExemptions {
    paths: Vec<String>,
}

impl CsrfExemptions {
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        let mut paths: Vec<String> = paths
            .into_iter()
            .map(Into::into)
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        paths.sort_unstable();
        paths.dedup();
        Self { paths }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths
            .binary_search_by(|probe| probe.as_str().cmp(path))
            .is_ok()
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
