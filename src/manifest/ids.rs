//! Identifier minting.

use std::collections::HashSet;

use uuid::Uuid;

use crate::models::{GroupId, Identifier, MembershipId, ReferenceId};

/// Supplies candidate identifiers. Uniqueness is enforced by
/// [`IdentifierGenerator`], not by the source.
pub trait IdentifierSource {
    fn draw(&mut self) -> Identifier;
}

impl<S: IdentifierSource + ?Sized> IdentifierSource for &mut S {
    fn draw(&mut self) -> Identifier {
        (**self).draw()
    }
}

/// Random identifiers: the first 24 hex digits of a v4 UUID, uppercased.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSource;

impl IdentifierSource for RandomSource {
    fn draw(&mut self) -> Identifier {
        let mut hex = Uuid::new_v4().simple().to_string();
        hex.truncate(Identifier::LEN);
        hex.make_ascii_uppercase();
        Identifier(hex)
    }
}

/// Deterministic identifiers `<namespace><counter>` for reproducible output.
#[derive(Debug, Clone)]
pub struct SequentialSource {
    namespace: u32,
    next: u64,
}

impl SequentialSource {
    pub fn new(namespace: u32) -> Self {
        Self { namespace, next: 1 }
    }
}

impl IdentifierSource for SequentialSource {
    fn draw(&mut self) -> Identifier {
        let id = format!("{:08X}{:016X}", self.namespace, self.next);
        self.next = self.next.wrapping_add(1);
        Identifier(id)
    }
}

/// Mints identifiers that are unique within one manifest.
pub struct IdentifierGenerator<S> {
    source: S,
    taken: HashSet<Identifier>,
}

impl<S: IdentifierSource> IdentifierGenerator<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            taken: HashSet::new(),
        }
    }

    /// A generator that will never return an identifier already in `text`.
    pub fn for_manifest(text: &str, source: S) -> Self {
        Self {
            source,
            taken: Identifier::scan(text),
        }
    }

    pub fn next_identifier(&mut self) -> Identifier {
        loop {
            let candidate = self.source.draw();
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
            tracing::debug!(identifier = %candidate, "identifier collision, drawing again");
        }
    }

    pub fn mint_reference(&mut self) -> ReferenceId {
        ReferenceId(self.next_identifier())
    }

    pub fn mint_membership(&mut self) -> MembershipId {
        MembershipId(self.next_identifier())
    }

    pub fn mint_group(&mut self) -> GroupId {
        GroupId(self.next_identifier())
    }

    /// Both identifiers a registered file needs.
    pub fn mint_pair(&mut self) -> (ReferenceId, MembershipId) {
        let reference = self.mint_reference();
        let membership = self.mint_membership();
        (reference, membership)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_source_shape() {
        let id = RandomSource.draw();
        assert_eq!(id.as_str().len(), Identifier::LEN);
        assert!(Identifier::parse(id.as_str()).is_some());
    }

    #[test]
    fn test_sequential_source_is_reproducible() {
        let mut a = SequentialSource::new(0xC0FFEE);
        let mut b = SequentialSource::new(0xC0FFEE);
        assert_eq!(a.draw(), b.draw());
        assert_eq!(a.draw().as_str(), "00C0FFEE0000000000000002");
    }

    #[test]
    fn test_skips_identifiers_present_in_manifest() {
        let manifest = "00000001000000000000000100000000 is too long, but \
                        000000010000000000000001 /* taken */";
        let mut ids = IdentifierGenerator::for_manifest(manifest, SequentialSource::new(1));
        assert_eq!(ids.next_identifier().as_str(), "000000010000000000000002");
    }

    #[test]
    fn test_pair_roles_are_distinct() {
        let mut ids = IdentifierGenerator::new(SequentialSource::new(7));
        let (reference, membership) = ids.mint_pair();
        assert_ne!(reference.identifier(), membership.identifier());
    }
}
