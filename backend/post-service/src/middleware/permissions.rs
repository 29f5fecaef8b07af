/// Authorization module for post-service
///
/// Every operation has one entry in `RULES`: a predicate over the caller and
/// the target resource. `authorize` is pure and runs after the target has been
/// loaded and before anything is mutated.
use std::fmt;

use crate::domain::{Identity, Post, User};
use crate::error::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListPosts,
    CreatePost,
    EditPost,
    DeletePost,
    ReactToPost,
    ListUsers,
    UpdateUser,
    ChangeUserRole,
    DeleteUser,
}

impl Operation {
    pub const ALL: [Operation; 9] = [
        Operation::ListPosts,
        Operation::CreatePost,
        Operation::EditPost,
        Operation::DeletePost,
        Operation::ReactToPost,
        Operation::ListUsers,
        Operation::UpdateUser,
        Operation::ChangeUserRole,
        Operation::DeleteUser,
    ];
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::ListPosts => "list_posts",
            Operation::CreatePost => "create_post",
            Operation::EditPost => "edit_post",
            Operation::DeletePost => "delete_post",
            Operation::ReactToPost => "react_to_post",
            Operation::ListUsers => "list_users",
            Operation::UpdateUser => "update_user",
            Operation::ChangeUserRole => "change_user_role",
            Operation::DeleteUser => "delete_user",
        };
        f.write_str(name)
    }
}

/// Target of an operation
#[derive(Debug, Clone, Copy)]
pub enum Resource<'a> {
    None,
    Post(&'a Post),
    User(&'a User),
}

/// Authorization denial with a caller-facing reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denied(pub &'static str);

impl From<Denied> for ServiceError {
    fn from(denied: Denied) -> Self {
        ServiceError::Forbidden(denied.0.to_string())
    }
}

pub const NOT_OWNER: &str = "not owner";
pub const ADMIN_ONLY: &str = "admin only";

struct Rule {
    operation: Operation,
    allows: fn(&Identity, Resource<'_>) -> bool,
    denial: &'static str,
}

fn any_identity(_: &Identity, _: Resource<'_>) -> bool {
    true
}

fn is_creator(identity: &Identity, resource: Resource<'_>) -> bool {
    matches!(resource, Resource::Post(post) if post.is_created_by(identity.id))
}

fn is_admin_or_creator(identity: &Identity, resource: Resource<'_>) -> bool {
    matches!(resource, Resource::Post(_)) && (identity.is_admin() || is_creator(identity, resource))
}

fn is_admin(identity: &Identity, _: Resource<'_>) -> bool {
    identity.is_admin()
}

fn is_admin_or_self(identity: &Identity, resource: Resource<'_>) -> bool {
    matches!(resource, Resource::User(user) if identity.is_admin() || user.id() == identity.id)
}

const RULES: &[Rule] = &[
    Rule {
        operation: Operation::ListPosts,
        allows: any_identity,
        denial: "",
    },
    Rule {
        operation: Operation::CreatePost,
        allows: any_identity,
        denial: "",
    },
    Rule {
        operation: Operation::EditPost,
        allows: is_creator,
        denial: NOT_OWNER,
    },
    Rule {
        operation: Operation::DeletePost,
        allows: is_admin_or_creator,
        denial: NOT_OWNER,
    },
    Rule {
        operation: Operation::ReactToPost,
        allows: any_identity,
        denial: "",
    },
    Rule {
        operation: Operation::ListUsers,
        allows: is_admin,
        denial: ADMIN_ONLY,
    },
    Rule {
        operation: Operation::UpdateUser,
        allows: is_admin_or_self,
        denial: NOT_OWNER,
    },
    Rule {
        operation: Operation::ChangeUserRole,
        allows: is_admin,
        denial: ADMIN_ONLY,
    },
    Rule {
        operation: Operation::DeleteUser,
        allows: is_admin_or_self,
        denial: NOT_OWNER,
    },
];

fn rule_for(operation: Operation) -> Option<&'static Rule> {
    RULES.iter().find(|rule| rule.operation == operation)
}

/// Evaluate the rule for `operation`
pub fn authorize(
    identity: &Identity,
    operation: Operation,
    resource: Resource<'_>,
) -> Result<(), Denied> {
    // an operation without a rule is denied
    let Some(rule) = rule_for(operation) else {
        return Err(Denied("no rule"));
    };
    if (rule.allows)(identity, resource) {
        Ok(())
    } else {
        tracing::warn!(
            user_id = %identity.id,
            role = %identity.role,
            %operation,
            reason = rule.denial,
            "authorization denied"
        );
        Err(Denied(rule.denial))
    }
}
