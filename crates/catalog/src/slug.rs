//! Deterministic excerpt filenames.
//!
//! The excerpt engine uses these names to detect finished work and the
//! catalog writer uses them to build `audioFile` paths, so both must go
//! through this module.

use std::collections::{BTreeSet, HashMap};

use crate::record::Identity;

/// File extension of every finished excerpt.
pub const EXCERPT_EXTENSION: &str = "mp3";

/// Reduce free text to a filesystem-safe lowercase slug.
///
/// Keeps alphanumerics and `_`, turns every run of whitespace or `-` into a
/// single `_`, drops everything else, then trims `_` from both ends.
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_gap = false;

    for c in text.chars() {
        if c.is_whitespace() || c == '-' {
            pending_gap = true;
        } else if c.is_alphanumeric() || c == '_' {
            if pending_gap {
                out.push('_');
                pending_gap = false;
            }
            out.extend(c.to_lowercase());
        }
    }

    out.trim_matches('_').to_string()
}

/// `{assignment}_{composer}_{title}` with every part slugified.
pub fn excerpt_stem(identity: Identity<'_>) -> String {
    format!(
        "{}_{}_{}",
        slugify(identity.assignment),
        slugify(identity.composer),
        slugify(identity.title)
    )
}

/// Final excerpt filename for a stem.
pub fn excerpt_filename(stem: &str) -> String {
    format!("{stem}.{EXCERPT_EXTENSION}")
}

/// Resolve the stem of every identity, disambiguating collisions.
///
/// Distinct identities that slugify to the same stem form a group. The
/// smallest identity of the group keeps the plain stem and the others get an
/// `_{hash8}` suffix derived from the identity itself. Identical identities
/// always share a stem. Output order matches input order.
pub fn resolve_stems<'a, I>(identities: I) -> Vec<String>
where
    I: IntoIterator<Item = Identity<'a>>,
{
    let identities: Vec<Identity<'a>> = identities.into_iter().collect();
    let bases: Vec<String> = identities.iter().map(|id| excerpt_stem(*id)).collect();

    let mut groups: HashMap<&str, BTreeSet<Identity<'a>>> = HashMap::new();
    for (base, id) in bases.iter().zip(&identities) {
        groups.entry(base.as_str()).or_default().insert(*id);
    }

    bases
        .iter()
        .zip(&identities)
        .map(|(base, id)| {
            let group = &groups[base.as_str()];
            match group.first() {
                Some(owner) if group.len() > 1 && owner != id => {
                    tracing::warn!(
                        stem = %base,
                        composer = id.composer,
                        title = id.title,
                        "Excerpt name collision, appending identity hash"
                    );
                    format!("{base}_{}", identity_hash8(*id))
                }
                _ => base.clone(),
            }
        })
        .collect()
}

/// First 8 hex digits of the BLAKE3 hash of the identity fields, joined by
/// the unit separator `0x1f`.
fn identity_hash8(identity: Identity<'_>) -> String {
    let joined = [identity.assignment, identity.composer, identity.title].join("\u{1f}");
    blake3::hash(joined.as_bytes()).to_hex().as_str()[..8].to_string()
}
