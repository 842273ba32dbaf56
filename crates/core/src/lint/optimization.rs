//! Static gas optimization hints

use once_cell::sync::Lazy;
use regex::Regex;

static LOOP_INDEXED_ACCESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\b(?:for|while)\s*\([^{]*\{[^}]*\b[A-Za-z_]\w*\s*\[")
        .expect("valid loop pattern")
});
static SIZED_UINT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\buint(\d+)\b").expect("valid uint pattern"));
static PUBLIC_FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bfunction\s+\w+\s*\([^)]*\)[^{;]*\bpublic\b").expect("valid function pattern")
});
static EXTERNAL_KEYWORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bexternal\b").expect("valid external pattern"));
static COMPOUND_REQUIRE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\brequire\s*\([^;]*&&").expect("valid require pattern"));

pub const CACHE_STORAGE_IN_LOOPS: &str =
    "Cache storage variables in memory before loops: every storage read or write inside a loop costs extra gas";
pub const PREFER_UINT256: &str =
    "Use uint256 instead of narrower unsigned integer types outside packed structs: smaller types cost extra gas for masking";
pub const EXTERNAL_INSTEAD_OF_PUBLIC: &str =
    "Consider using external instead of public for functions that are never called internally";
pub const SPLIT_REQUIRE: &str =
    "Split require conditions joined by && into separate require statements for cheaper and clearer failures";

/// An advisory triggered by a lexical condition
pub struct Hint {
    pub id: &'static str,
    pub applies: fn(&str) -> bool,
    pub advice: &'static str,
}

/// Hints in the order they are reported
pub static HINTS: &[Hint] = &[
    Hint {
        id: "storage-in-loop",
        applies: storage_access_in_loop,
        advice: CACHE_STORAGE_IN_LOOPS,
    },
    Hint {
        id: "narrow-uint",
        applies: uses_narrow_uint,
        advice: PREFER_UINT256,
    },
    Hint {
        id: "public-not-external",
        applies: public_without_external,
        advice: EXTERNAL_INSTEAD_OF_PUBLIC,
    },
    Hint {
        id: "compound-require",
        applies: compound_require,
        advice: SPLIT_REQUIRE,
    },
];

/// Returns one advisory per triggered hint
pub fn advise(source: &str) -> Vec<String> {
    HINTS
        .iter()
        .filter(|hint| (hint.applies)(source))
        .inspect(|hint| tracing::debug!("Optimization hint {} triggered", hint.id))
        .map(|hint| hint.advice.to_string())
        .collect()
}

fn storage_access_in_loop(source: &str) -> bool {
    LOOP_INDEXED_ACCESS.is_match(source)
}

fn uses_narrow_uint(source: &str) -> bool {
    SIZED_UINT
        .captures_iter(source)
        .filter_map(|caps| caps.get(1))
        .any(|bits| bits.as_str() != "256")
}

fn public_without_external(source: &str) -> bool {
    PUBLIC_FUNCTION.is_match(source) && !EXTERNAL_KEYWORD.is_match(source)
}

fn compound_require(source: &str) -> bool {
    COMPOUND_REQUIRE.is_match(source)
}
