//! Run-scoped identity map for organizations, places and framework agreements.
//!
//! The resolver is seeded with every stored organization and place, so a
//! lookup never goes back to the database: an entity is either in the map or
//! does not exist yet. New entities get their `uid` immediately and are staged
//! for the next batch; stored entities whose role flags were raised are staged
//! as updates.

use std::collections::HashMap;

use decp_core::entities::{Organization, Place};
use decp_core::enums::{IdentifierKind, PlaceKind};

use crate::DecpDb;
use crate::error::DatabaseError;

/// Role an organization plays in the record referencing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Buyer,
    Seller,
}

/// Monotonic surrogate key generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UidSequence {
    next: i64,
}

impl UidSequence {
    /// Continue after `max_uid`, the highest key already stored.
    #[must_use]
    pub const fn after(max_uid: i64) -> Self {
        Self { next: max_uid + 1 }
    }

    pub const fn next(&mut self) -> i64 {
        let uid = self.next;
        self.next += 1;
        uid
    }
}

impl Default for UidSequence {
    fn default() -> Self {
        Self::after(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryState {
    /// Matches the stored row.
    Stored,
    /// Not written yet.
    New,
    /// Stored, but its role flags were raised since.
    Dirty,
}

#[derive(Debug)]
struct OrgEntry {
    org: Organization,
    state: EntryState,
}

/// Entities the resolver staged since the last flush.
#[derive(Debug, Default)]
pub struct PendingEntities {
    pub new_organizations: Vec<Organization>,
    pub updated_organizations: Vec<Organization>,
    pub new_places: Vec<Place>,
}

#[derive(Debug, Default)]
pub struct EntityResolver {
    organizations: HashMap<IdentifierKind, HashMap<String, OrgEntry>>,
    places: HashMap<PlaceKind, HashMap<String, i64>>,
    frameworks: HashMap<String, i64>,
    touched: Vec<(IdentifierKind, String)>,
    new_places: Vec<Place>,
    organization_uids: UidSequence,
    place_uids: UidSequence,
}

impl EntityResolver {
    /// Seed a resolver with every stored organization and place.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the preload queries fail.
    pub async fn preload(db: &DecpDb) -> Result<Self, DatabaseError> {
        let organizations = db.load_organizations().await?;
        let places = db.load_places().await?;
        tracing::debug!(
            organizations = organizations.len(),
            places = places.len(),
            "resolver preloaded"
        );
        Ok(Self::from_snapshot(organizations, places))
    }

    /// Seed a resolver from already loaded rows.
    #[must_use]
    pub fn from_snapshot(organizations: Vec<Organization>, places: Vec<Place>) -> Self {
        let mut resolver = Self::default();
        let max_org = organizations.iter().map(|o| o.uid).max().unwrap_or(0);
        let max_place = places.iter().map(|p| p.uid).max().unwrap_or(0);
        resolver.organization_uids = UidSequence::after(max_org);
        resolver.place_uids = UidSequence::after(max_place);

        for org in organizations {
            resolver
                .organizations
                .entry(org.identifier_kind)
                .or_default()
                .insert(
                    org.identifier.clone(),
                    OrgEntry {
                        org,
                        state: EntryState::Stored,
                    },
                );
        }
        for place in places {
            resolver
                .places
                .entry(place.kind)
                .or_default()
                .insert(place.code, place.uid);
        }
        resolver
    }

    /// Resolve an organization by natural key, creating it if unknown.
    ///
    /// A role raises the matching flag; flags are never lowered. Returns the
    /// organization's `uid`, stable for the whole run.
    pub fn organization(
        &mut self,
        identifier: &str,
        kind: IdentifierKind,
        role: Option<Role>,
    ) -> i64 {
        let by_kind = self.organizations.entry(kind).or_default();
        let entry = if let Some(entry) = by_kind.get_mut(identifier) {
            entry
        } else {
            let uid = self.organization_uids.next();
            self.touched.push((kind, identifier.to_string()));
            by_kind.entry(identifier.to_string()).or_insert(OrgEntry {
                org: Organization::new(uid, identifier.to_string(), kind),
                state: EntryState::New,
            })
        };

        let raised = match role {
            Some(Role::Buyer) if !entry.org.is_buyer => {
                entry.org.is_buyer = true;
                true
            }
            Some(Role::Seller) if !entry.org.is_seller => {
                entry.org.is_seller = true;
                true
            }
            _ => false,
        };
        if raised && entry.state == EntryState::Stored {
            entry.state = EntryState::Dirty;
            self.touched.push((kind, identifier.to_string()));
        }
        entry.org.uid
    }

    /// Resolve a place by natural key, creating it if unknown.
    pub fn place(&mut self, code: &str, kind: PlaceKind) -> i64 {
        let by_kind = self.places.entry(kind).or_default();
        if let Some(uid) = by_kind.get(code) {
            return *uid;
        }
        let uid = self.place_uids.next();
        by_kind.insert(code.to_string(), uid);
        self.new_places.push(Place {
            uid,
            code: code.to_string(),
            kind,
        });
        uid
    }

    /// Framework agreement registered earlier in this run under `id`.
    ///
    /// Forward references resolve to `None`.
    #[must_use]
    pub fn framework(&self, id: &str) -> Option<i64> {
        self.frameworks.get(id).copied()
    }

    /// Make a transformed contract available as a framework agreement.
    ///
    /// A later contract with the same id replaces it.
    pub fn register_framework(&mut self, id: String, contract_uid: i64) {
        self.frameworks.insert(id, contract_uid);
    }

    /// Current state of a resolved organization.
    #[must_use]
    pub fn get_organization(&self, identifier: &str, kind: IdentifierKind) -> Option<&Organization> {
        self.organizations
            .get(&kind)
            .and_then(|m| m.get(identifier))
            .map(|e| &e.org)
    }

    /// Number of organizations known to the run.
    #[must_use]
    pub fn organization_count(&self) -> usize {
        self.organizations.values().map(HashMap::len).sum()
    }

    /// Number of places known to the run.
    #[must_use]
    pub fn place_count(&self) -> usize {
        self.places.values().map(HashMap::len).sum()
    }

    /// Hand over everything staged since the last call.
    ///
    /// Staged entities are considered stored afterwards.
    pub fn take_pending(&mut self) -> PendingEntities {
        let mut pending = PendingEntities {
            new_places: std::mem::take(&mut self.new_places),
            ..PendingEntities::default()
        };
        for (kind, identifier) in self.touched.drain(..) {
            let Some(entry) = self
                .organizations
                .get_mut(&kind)
                .and_then(|m| m.get_mut(&identifier))
            else {
                continue;
            };
            match entry.state {
                EntryState::New => pending.new_organizations.push(entry.org.clone()),
                EntryState::Dirty => pending.updated_organizations.push(entry.org.clone()),
                EntryState::Stored => {}
            }
            entry.state = EntryState::Stored;
        }
        pending
    }
}
