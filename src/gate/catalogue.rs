//! Endpoint catalogue
//!
//! Every endpoint names its schema and its consistency requirements here.
//! `Gates::build` turns the whole table into gates at boot.

use crate::consistency::{compare, PathResult, Requirement};
use crate::schema::SchemaRegistry;

use super::check::Gate;
use super::errors::{GateBuildError, GateBuildResult};

/// Every gated endpoint of the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    PostUsers,
    GetUser,
    PatchUser,
    PostTags,
    GetTag,
    GetTagsLike,
    PostUserTags,
    GetUserTags,
    PatchUserTag,
    DeleteUserTag,
    PostContacts,
    GetContact,
    GetUserContacts,
    PatchConfirmContact,
    PatchContact,
    DeleteContact,
    PostMessages,
    GetMessages,
    GetThreads,
    PatchMessage,
    PostDits,
    GetDit,
    PatchDit,
    GetDits,
    PostDitTags,
    GetDitTags,
    DeleteDitTag,
    PostVotes,
    DeleteVote,
    PostComments,
    GetComments,
    PatchComment,
    DeleteComment,
    PostCares,
    DeleteCare,
}

impl Endpoint {
    pub const ALL: [Endpoint; 35] = [
        Endpoint::PostUsers,
        Endpoint::GetUser,
        Endpoint::PatchUser,
        Endpoint::PostTags,
        Endpoint::GetTag,
        Endpoint::GetTagsLike,
        Endpoint::PostUserTags,
        Endpoint::GetUserTags,
        Endpoint::PatchUserTag,
        Endpoint::DeleteUserTag,
        Endpoint::PostContacts,
        Endpoint::GetContact,
        Endpoint::GetUserContacts,
        Endpoint::PatchConfirmContact,
        Endpoint::PatchContact,
        Endpoint::DeleteContact,
        Endpoint::PostMessages,
        Endpoint::GetMessages,
        Endpoint::GetThreads,
        Endpoint::PatchMessage,
        Endpoint::PostDits,
        Endpoint::GetDit,
        Endpoint::PatchDit,
        Endpoint::GetDits,
        Endpoint::PostDitTags,
        Endpoint::GetDitTags,
        Endpoint::DeleteDitTag,
        Endpoint::PostVotes,
        Endpoint::DeleteVote,
        Endpoint::PostComments,
        Endpoint::GetComments,
        Endpoint::PatchComment,
        Endpoint::DeleteComment,
        Endpoint::PostCares,
        Endpoint::DeleteCare,
    ];

    /// Name of the schema document the endpoint is validated against
    pub fn schema_name(&self) -> &'static str {
        match self {
            Endpoint::PostUsers => "postUsers",
            Endpoint::GetUser => "getUser",
            Endpoint::PatchUser => "patchUser",
            Endpoint::PostTags => "postTags",
            Endpoint::GetTag => "getTag",
            Endpoint::GetTagsLike => "getTagsLike",
            Endpoint::PostUserTags => "postUserTags",
            Endpoint::GetUserTags => "getUserTags",
            Endpoint::PatchUserTag => "patchUserTag",
            Endpoint::DeleteUserTag => "deleteUserTag",
            Endpoint::PostContacts => "postContacts",
            Endpoint::GetContact => "getContact",
            Endpoint::GetUserContacts => "getUserContacts",
            Endpoint::PatchConfirmContact => "patchConfirmContact",
            Endpoint::PatchContact => "patchContact",
            Endpoint::DeleteContact => "deleteContact",
            Endpoint::PostMessages => "postMessages",
            Endpoint::GetMessages => "getMessages",
            Endpoint::GetThreads => "getThreads",
            Endpoint::PatchMessage => "patchMessage",
            Endpoint::PostDits => "postDits",
            Endpoint::GetDit => "getDit",
            Endpoint::PatchDit => "patchDit",
            Endpoint::GetDits => "getDits",
            Endpoint::PostDitTags => "postDitTags",
            Endpoint::GetDitTags => "getDitTags",
            Endpoint::DeleteDitTag => "deleteDitTag",
            Endpoint::PostVotes => "postVotes",
            Endpoint::DeleteVote => "deleteVote",
            Endpoint::PostComments => "postComments",
            Endpoint::GetComments => "getComments",
            Endpoint::PatchComment => "patchComment",
            Endpoint::DeleteComment => "deleteComment",
            Endpoint::PostCares => "postCares",
            Endpoint::DeleteCare => "deleteCare",
        }
    }

    /// Cross-field requirements checked after the schema passes
    pub fn requirements(&self) -> PathResult<Vec<Requirement>> {
        let requirements = match self {
            Endpoint::PatchUser => vec![
                Requirement::new("auth.username", "params.username")?
                    .message("you can only update your own profile"),
                Requirement::new("body.id", "params.username")?,
            ],
            Endpoint::PostUserTags | Endpoint::DeleteUserTag => vec![
                Requirement::new("auth.username", "params.username")?
                    .message("you can only change your own tags"),
            ],
            Endpoint::PatchUserTag => vec![
                Requirement::new("auth.username", "params.username")?
                    .message("you can only change your own tags"),
                Requirement::new("body.id", ["params.username", "params.tagname"])?
                    .compare(compare::joined("--")),
            ],
            Endpoint::PostContacts => vec![
                Requirement::new("body.to.username", "auth.username")?
                    .compare(compare::different())
                    .message("you cannot create a contact to yourself"),
            ],
            Endpoint::PatchConfirmContact => vec![
                Requirement::new("body.id", ["params.from", "params.to"])?
                    .compare(compare::joined("--")),
                Requirement::new("auth.username", "params.to")?
                    .message("only the receiver can confirm a contact"),
            ],
            Endpoint::PatchContact => vec![
                Requirement::new("body.id", ["params.from", "params.to"])?
                    .compare(compare::joined("--")),
                Requirement::new("auth.username", ["params.from", "params.to"])?
                    .compare(compare::member_of())
                    .message("you can only update a contact you are part of"),
            ],
            Endpoint::DeleteContact => vec![
                Requirement::new("auth.username", ["params.from", "params.to"])?
                    .compare(compare::member_of())
                    .message("you can only remove a contact you are part of"),
            ],
            Endpoint::PostMessages => vec![
                Requirement::new("body.to.username", "auth.username")?
                    .compare(compare::different())
                    .message("you cannot send a message to yourself"),
            ],
            Endpoint::GetMessages => vec![
                Requirement::new("query.filter.with[0]", "auth.username")?
                    .compare(compare::different())
                    .message("you cannot read messages with yourself"),
            ],
            Endpoint::PatchMessage | Endpoint::PatchDit | Endpoint::PatchComment => {
                vec![Requirement::new("body.id", "params.id")?]
            }
            _ => Vec::new(),
        };
        Ok(requirements)
    }
}

/// All endpoint gates, built once at boot and shared read-only
#[derive(Debug, Clone)]
pub struct Gates {
    gates: Vec<Gate>,
}

impl Gates {
    /// Builds a gate for every endpoint; the first failure aborts
    pub fn build(registry: &SchemaRegistry) -> GateBuildResult<Self> {
        let mut gates = Vec::with_capacity(Endpoint::ALL.len());
        for endpoint in Endpoint::ALL {
            let requirements = endpoint.requirements().map_err(|source| GateBuildError::Path {
                endpoint: endpoint.schema_name(),
                source,
            })?;
            gates.push(Gate::build(registry, endpoint.schema_name(), requirements)?);
        }
        Ok(Self { gates })
    }

    pub fn get(&self, endpoint: Endpoint) -> &Gate {
        &self.gates[endpoint as usize]
    }

    /// `(endpoint, gate)` pairs in catalogue order
    pub fn iter(&self) -> impl Iterator<Item = (Endpoint, &Gate)> {
        Endpoint::ALL.into_iter().zip(self.gates.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_order_matches_discriminants() {
        for (index, endpoint) in Endpoint::ALL.iter().enumerate() {
            assert_eq!(*endpoint as usize, index);
        }
    }

    #[test]
    fn test_every_requirement_parses() {
        for endpoint in Endpoint::ALL {
            assert!(endpoint.requirements().is_ok(), "{:?}", endpoint);
        }
    }

    #[test]
    fn test_builtin_gates_build() {
        let registry = SchemaRegistry::builtin().unwrap();
        let gates = Gates::build(&registry).unwrap();
        assert_eq!(gates.iter().count(), Endpoint::ALL.len());
        assert_eq!(gates.get(Endpoint::PostContacts).schema_name(), "postContacts");
        assert_eq!(gates.get(Endpoint::PatchContact).requirements().len(), 2);
    }

    #[test]
    fn test_missing_schema_aborts_build() {
        let err = Gates::build(&SchemaRegistry::default()).unwrap_err();
        assert_eq!(err.code(), "DIT_UNKNOWN_SCHEMA");
        assert_eq!(err.endpoint(), "postUsers");
    }
}
