//! Client identification engine for meshwatch
//!
//! Peers on the network self-report a free-form agent string during the
//! protocol handshake (for example `teku/teku/v21.8.2/linux-x86_64/...`).
//! Every implementation formats this string differently: slash-delimited,
//! hyphen-delimited, truncated, or carrying build metadata and commit hashes.
//! This crate resolves that text into a stable `(client name, client version)`
//! pair that is comparable across the whole observed population.
//!
//! Classification is a pure, total function: every input, including the empty
//! string, produces a defined [`ClientIdentity`]. There is no I/O and no
//! shared state, so [`classify`] may be called concurrently from any number
//! of tasks without coordination.
//!
//! # Example
//!
//! ```
//! use meshwatch_identify::classify;
//!
//! let identity = classify("Lighthouse/v1.5.1-b0ac346/x86_64-linux");
//! assert_eq!(identity.name, "Lighthouse");
//! assert_eq!(identity.version, "v1.5.1");
//! ```

use serde::{Deserialize, Serialize};

/// Canonical name reported when the agent string is empty
pub const NOT_IDENTIFIED: &str = "NotIdentified";

/// Sentinel version meaning "a version was expected but not extractable"
///
/// Distinct from the empty string, which marks peer categories (crawlers)
/// that never report a version at all.
pub const UNKNOWN_VERSION: &str = "Unknown";

/// Normalized result of classifying one agent string
///
/// `name` is a canonical client label for recognized agents, the original
/// token for unrecognized single-word agents, or [`NOT_IDENTIFIED`] for the
/// empty input. `version` is a normalized version token, the empty string
/// for peers that never report one, or [`UNKNOWN_VERSION`] when a version
/// was expected but could not be derived.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientIdentity {
    /// Canonical client name
    pub name: String,

    /// Normalized version token
    pub version: String,
}

impl ClientIdentity {
    /// Identity assigned to the empty agent string
    #[must_use]
    pub fn not_identified() -> Self {
        Self {
            name: NOT_IDENTIFIED.to_string(),
            version: String::new(),
        }
    }

    /// Whether the agent was resolved to something other than the empty case
    #[must_use]
    pub fn is_identified(&self) -> bool {
        self.name != NOT_IDENTIFIED
    }
}

impl std::fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.version.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}/{}", self.name, self.version)
        }
    }
}

/// How to derive a version once a rule has matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VersionStrategy {
    /// Split the agent on `/` and take the first version-shaped segment
    SlashSegments,
    /// Infrastructure tooling: version tracking is not meaningful, report ""
    NameOnly,
}

/// One recognition rule: case-insensitive substring match, first match wins
struct ClientRule {
    pattern: &'static str,
    canonical: &'static str,
    strategy: VersionStrategy,
}

/// Ordered recognition table, most-specific/most-common clients first.
///
/// The table is data, not logic: canonical names observed in the wild are
/// preserved verbatim (including `go-ipgs` and `hydra-boost`), and a
/// correction is a one-line edit here rather than a change to the algorithm.
const CLIENT_RULES: &[ClientRule] = &[
    ClientRule {
        pattern: "teku",
        canonical: "Teku",
        strategy: VersionStrategy::SlashSegments,
    },
    ClientRule {
        pattern: "prysm",
        canonical: "Prysm",
        strategy: VersionStrategy::SlashSegments,
    },
    ClientRule {
        pattern: "lighthouse",
        canonical: "Lighthouse",
        strategy: VersionStrategy::SlashSegments,
    },
    ClientRule {
        pattern: "nimbus",
        canonical: "Nimbus",
        strategy: VersionStrategy::SlashSegments,
    },
    ClientRule {
        pattern: "lodestar",
        canonical: "Lodestar",
        strategy: VersionStrategy::SlashSegments,
    },
    ClientRule {
        pattern: "grandine",
        canonical: "Grandine",
        strategy: VersionStrategy::SlashSegments,
    },
    // Grandine is the only known client announcing the bare libp2p agent
    ClientRule {
        pattern: "rust-libp2p",
        canonical: "Grandine",
        strategy: VersionStrategy::SlashSegments,
    },
    ClientRule {
        pattern: "eth2-crawler",
        canonical: "NodeWatch",
        strategy: VersionStrategy::NameOnly,
    },
    ClientRule {
        pattern: "armiarma-crawler",
        canonical: "BSC-Crawler",
        strategy: VersionStrategy::NameOnly,
    },
    ClientRule {
        pattern: "bsc-crawler",
        canonical: "BSC-Crawler",
        strategy: VersionStrategy::NameOnly,
    },
    ClientRule {
        pattern: "go-ipfs",
        canonical: "go-ipgs",
        strategy: VersionStrategy::SlashSegments,
    },
    ClientRule {
        pattern: "hydra-booster",
        canonical: "hydra-boost",
        strategy: VersionStrategy::SlashSegments,
    },
];

/// Classify a raw agent string into a normalized client identity
///
/// Evaluates a fixed, ordered rule table; the first matching rule wins.
/// Unrecognized agents degrade to a best-effort echo of the input rather
/// than failing, so this function is total: it never panics and never
/// returns an error, whatever the peer reported.
///
/// # Example
///
/// ```
/// use meshwatch_identify::{classify, UNKNOWN_VERSION};
///
/// assert_eq!(classify("nimbus").version, UNKNOWN_VERSION);
/// assert_eq!(classify("eth2-crawler").version, "");
/// ```
#[must_use]
pub fn classify(agent: &str) -> ClientIdentity {
    let agent = agent.trim();
    if agent.is_empty() {
        return ClientIdentity::not_identified();
    }

    let lowered = agent.to_ascii_lowercase();
    for rule in CLIENT_RULES {
        if lowered.contains(rule.pattern) {
            let version = match rule.strategy {
                VersionStrategy::SlashSegments => {
                    slash_version(agent).unwrap_or_else(|| UNKNOWN_VERSION.to_string())
                }
                VersionStrategy::NameOnly => String::new(),
            };
            return ClientIdentity {
                name: rule.canonical.to_string(),
                version,
            };
        }
    }

    fallback_identity(agent)
}

/// Best-effort echo for agents no rule recognizes
fn fallback_identity(agent: &str) -> ClientIdentity {
    if agent.contains('/') {
        let name = agent.split('/').next().unwrap_or(agent);
        if !name.is_empty() {
            return ClientIdentity {
                name: name.to_string(),
                version: slash_version(agent).unwrap_or_else(|| UNKNOWN_VERSION.to_string()),
            };
        }
    } else if let Some((name, rest)) = agent.split_once('-') {
        // Single-token `name-version+buildmeta` shape, e.g. lotus-1.13.0+mainnet
        if !name.is_empty() && looks_like_version(rest) {
            let version = rest.split('+').next().unwrap_or(rest);
            return ClientIdentity {
                name: name.to_string(),
                version: version.to_string(),
            };
        }
    }

    ClientIdentity {
        name: agent.to_string(),
        version: UNKNOWN_VERSION.to_string(),
    }
}

/// Extract a version from a slash-segmented agent string
///
/// Picks the first `/`-segment that begins with `v` followed by a digit, or
/// with a digit, then keeps only the leading semantic-version core: build
/// metadata after `+` and trailing `-<hash>` suffixes are discarded.
fn slash_version(agent: &str) -> Option<String> {
    let segment = agent.split('/').find(|s| looks_like_version(s))?;
    let core = semver_core(segment);
    if core.is_empty() { None } else { Some(core) }
}

/// Whether a token starts like a version: a digit, or `v` followed by a digit
fn looks_like_version(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(c) if c.is_ascii_digit() => true,
        Some('v') | Some('V') => chars.next().is_some_and(|c| c.is_ascii_digit()),
        _ => false,
    }
}

/// Leading `v?MAJOR.MINOR.PATCH` core of a version segment
fn semver_core(segment: &str) -> String {
    let mut end = 0;
    for (i, c) in segment.char_indices() {
        let keep = c.is_ascii_digit() || c == '.' || (i == 0 && (c == 'v' || c == 'V'));
        if !keep {
            break;
        }
        end = i + c.len_utf8();
    }
    segment[..end].trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn assert_classified(agent: &str, name: &str, version: &str) {
        let identity = classify(agent);
        assert_eq!(identity.name, name, "name for agent {agent:?}");
        assert_eq!(identity.version, version, "version for agent {agent:?}");
    }

    #[test]
    fn test_teku_agents() {
        assert_classified("teku/teku/v21.8.2/linux-x86_64/corretto-java-16", "Teku", "v21.8.2");
        // Build metadata after `+` is discarded
        assert_classified(
            "teku/teku/v21.7.0+9-g77b4b9e/linux-x86_64/-ubuntu-openjdk64bitservervm-java-11",
            "Teku",
            "v21.7.0",
        );
    }

    #[test]
    fn test_prysm_agents() {
        assert_classified(
            "Prysm/v1.4.3/8bca66ac6408a03af52d65541f58384007ed50ef",
            "Prysm",
            "v1.4.3",
        );
        assert_classified(
            "Prysm/v1.3.8-hotfix+6c0942/6c09424feb3141b96016bed817d7ade1cd75deb7",
            "Prysm",
            "v1.3.8",
        );
    }

    #[test]
    fn test_lighthouse_agents() {
        assert_classified("Lighthouse/v1.5.1-b0ac346/x86_64-linux", "Lighthouse", "v1.5.1");
        assert_classified("Lighthouse/v2.0.0-7c88f58/x86_64-linux", "Lighthouse", "v2.0.0");
    }

    #[test]
    fn test_bare_known_token_gets_unknown_version() {
        assert_classified("nimbus", "Nimbus", UNKNOWN_VERSION);
    }

    #[test]
    fn test_rust_libp2p_maps_to_grandine() {
        assert_classified("rust-libp2p/0.31.0", "Grandine", "0.31.0");
    }

    #[test]
    fn test_crawler_agents_have_empty_version() {
        // Empty, not "Unknown": these peers never report a version
        assert_classified("eth2-crawler", "NodeWatch", "");
        assert_classified("armiarma-crawler", "BSC-Crawler", "");
        assert_classified("bsc-crawler", "BSC-Crawler", "");
    }

    #[test]
    fn test_ipfs_tooling_agents() {
        assert_classified("go-ipfs/0.8.0/48f94e2", "go-ipgs", "0.8.0");
        assert_classified("hydra-booster/0.7.4", "hydra-boost", "0.7.4");
    }

    #[test]
    fn test_unknown_bare_token_echoes_verbatim() {
        assert_classified("storm", "storm", UNKNOWN_VERSION);
    }

    #[test]
    fn test_hyphen_segmented_agent() {
        assert_classified("lotus-1.13.0+mainnet+git.7a55e8e8", "lotus", "1.13.0");
    }

    #[test]
    fn test_empty_agent() {
        assert_classified("", NOT_IDENTIFIED, "");
        assert_classified("   ", NOT_IDENTIFIED, "");
        assert!(!classify("").is_identified());
        assert!(classify("nimbus").is_identified());
    }

    #[test]
    fn test_case_insensitive_matching() {
        assert_classified("TEKU/teku/v21.8.2/linux", "Teku", "v21.8.2");
        assert_classified("NIMBUS", "Nimbus", UNKNOWN_VERSION);
    }

    #[test]
    fn test_unknown_slash_agent_echoes_first_segment() {
        assert_classified("erigon/2.30.0/linux", "erigon", "2.30.0");
        assert_classified("mysteryclient/unversioned", "mysteryclient", UNKNOWN_VERSION);
    }

    #[test]
    fn test_rule_priority_is_declaration_order() {
        // Contains both "teku" and a crawler-ish suffix; the teku rule is
        // declared first and must win.
        assert_classified("teku-crawler/v1.0.0", "Teku", "v1.0.0");
    }

    #[test]
    fn test_degenerate_tokens() {
        assert_classified("-", "-", UNKNOWN_VERSION);
        assert_classified("/", "/", UNKNOWN_VERSION);
        assert_classified("v", "v", UNKNOWN_VERSION);
    }

    #[test]
    fn test_semver_core_truncation() {
        assert_eq!(semver_core("v1.3.8-hotfix+6c0942"), "v1.3.8");
        assert_eq!(semver_core("v21.7.0+9-g77b4b9e"), "v21.7.0");
        assert_eq!(semver_core("0.31.0"), "0.31.0");
        assert_eq!(semver_core("1.13."), "1.13");
    }

    #[test]
    fn test_display() {
        assert_eq!(classify("nimbus").to_string(), "Nimbus/Unknown");
        assert_eq!(classify("eth2-crawler").to_string(), "NodeWatch");
        assert_eq!(classify("").to_string(), "NotIdentified");
    }

    #[test]
    fn test_serde_round_trip() {
        let identity = classify("teku/teku/v21.8.2/linux-x86_64/corretto-java-16");
        let json = serde_json::to_string(&identity).unwrap();
        let back: ClientIdentity = serde_json::from_str(&json).unwrap();
        assert_eq!(identity, back);
    }

    proptest! {
        #[test]
        fn classify_is_total(agent in ".*") {
            // Must never panic, whatever the peer reported
            let _ = classify(&agent);
        }

        #[test]
        fn classify_is_pure(agent in ".*") {
            prop_assert_eq!(classify(&agent), classify(&agent));
        }

        #[test]
        fn classify_always_names(agent in ".*") {
            // Every input resolves to a non-empty name
            prop_assert!(!classify(&agent).name.is_empty());
        }

        #[test]
        fn recognized_clients_win_over_fallback(version in "v[0-9]{1,2}\\.[0-9]{1,2}\\.[0-9]{1,2}") {
            let identity = classify(&format!("Lighthouse/{version}/x86_64-linux"));
            prop_assert_eq!(identity.name, "Lighthouse");
            prop_assert_eq!(identity.version, version);
        }
    }
}
