//! Resolver operations
//!
//! Every field the API resolves is one variant of [`Operation`]. The payload
//! names the field and carries its already-authenticated arguments:
//!
//! ```json
//! { "field": "sendMessage", "arguments": { "groupId": "...", "userId": "...", "messageText": "hi" } }
//! ```

use chat_storage::{
    entity::{
        GroupCreateRequest, MembershipCreateRequest, Message, MessageCreateRequest,
        TypingIndicatorRequest, UserCreateRequest,
    },
    store::ContinuationToken,
};
use futures::TryStreamExt;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::{Validate, ValidationErrors};

use crate::{state::ChatServices, types::AppError};

/// Arguments of `createUserAccount`
#[derive(Debug, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateUserAccountArgs {
    /// Unique username
    #[validate(length(min = 1, max = 128))]
    pub username: String,
    /// Unique email address
    #[validate(email)]
    pub email: String,
    /// Optional profile picture URL
    #[validate(length(min = 1, max = 2048))]
    pub profile_picture: Option<String>,
}

/// Arguments naming a user by username
#[derive(Debug, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UsernameArgs {
    /// Username to look up
    #[validate(length(min = 1, max = 128))]
    pub username: String,
}

/// Arguments naming a user by id
#[derive(Debug, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UserIdArgs {
    /// User id
    #[validate(length(min = 1, max = 128))]
    pub user_id: String,
}

/// Arguments of `createGroup`
#[derive(Debug, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateGroupArgs {
    /// Creator of the group
    #[validate(length(min = 1, max = 128))]
    pub user_id: String,
    /// Display name
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Optional group picture URL
    #[validate(length(min = 1, max = 2048))]
    pub group_profile_pic: Option<String>,
    /// Optional description
    #[validate(length(max = 1024))]
    pub description: Option<String>,
}

/// Arguments of `addUserToGroup`
#[derive(Debug, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GroupMemberArgs {
    /// Group to join
    #[validate(length(min = 1, max = 128))]
    pub group_id: String,
    /// Joining user
    #[validate(length(min = 1, max = 128))]
    pub user_id: String,
}

/// Arguments of `sendMessage`
#[derive(Debug, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SendMessageArgs {
    /// Target group
    #[validate(length(min = 1, max = 128))]
    pub group_id: String,
    /// Author
    #[validate(length(min = 1, max = 128))]
    pub user_id: String,
    /// Message body
    #[validate(length(min = 1, max = 4096))]
    pub message_text: String,
}

/// Arguments of `typingIndicator`
#[derive(Debug, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TypingIndicatorArgs {
    /// Group the user is typing in
    #[validate(length(min = 1, max = 128))]
    pub group_id: String,
    /// Typing user
    #[validate(length(min = 1, max = 128))]
    pub user_id: String,
    /// Whether the user is typing
    pub typing: bool,
}

/// Arguments of `getAllMessagesPerGroup`
#[derive(Debug, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MessagesPerGroupArgs {
    /// Group to list
    #[validate(length(min = 1, max = 128))]
    pub group_id: String,
    /// Page size; the whole listing is returned when absent
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u32>,
    /// Token from a previous page
    pub next_token: Option<String>,
}

/// Parent message of the `Message.user` field
#[derive(Debug, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MessageSource {
    /// Message id
    #[validate(length(min = 1))]
    pub id: String,
    /// Author id
    #[validate(length(min = 1, max = 128))]
    pub user_id: String,
    /// Owning group
    pub group_id: String,
    /// Message body
    pub message_text: String,
    /// Creation time in epoch milliseconds
    pub created_on: i64,
}

impl From<MessageSource> for Message {
    fn from(source: MessageSource) -> Self {
        Self {
            id: source.id,
            user_id: source.user_id,
            group_id: source.group_id,
            message_text: source.message_text,
            created_on: source.created_on,
        }
    }
}

/// Arguments of `messageUser`
#[derive(Debug, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MessageUserArgs {
    /// Message whose author is resolved
    #[validate(nested)]
    pub source: MessageSource,
}

/// One page of messages
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePage {
    /// Messages in creation order
    pub items: Vec<Message>,
    /// Token for the next page, absent on the last page
    pub next_token: Option<String>,
}

/// Every field the resolver serves
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(tag = "field", content = "arguments", rename_all = "camelCase")]
pub enum Operation {
    /// Registers a user
    CreateUserAccount(CreateUserAccountArgs),
    /// Looks up a user by username
    GetUserAccount(UsernameArgs),
    /// Creates a group
    CreateGroup(CreateGroupArgs),
    /// Adds a user to a group
    AddUserToGroup(GroupMemberArgs),
    /// Posts a message to a group
    SendMessage(SendMessageArgs),
    /// Records a user's typing state in a group
    TypingIndicator(TypingIndicatorArgs),
    /// Lists the groups a user created
    GetAllGroupsCreatedByUser(UserIdArgs),
    /// Lists the groups a user belongs to
    GetGroupsUserBelongsTo(UserIdArgs),
    /// Lists the messages of a group
    GetAllMessagesPerGroup(MessagesPerGroupArgs),
    /// Resolves the author of a message
    MessageUser(MessageUserArgs),
}

impl Validate for Operation {
    fn validate(&self) -> Result<(), ValidationErrors> {
        match self {
            Self::CreateUserAccount(args) => args.validate(),
            Self::GetUserAccount(args) => args.validate(),
            Self::CreateGroup(args) => args.validate(),
            Self::AddUserToGroup(args) => args.validate(),
            Self::SendMessage(args) => args.validate(),
            Self::TypingIndicator(args) => args.validate(),
            Self::GetAllGroupsCreatedByUser(args) | Self::GetGroupsUserBelongsTo(args) => {
                args.validate()
            }
            Self::GetAllMessagesPerGroup(args) => args.validate(),
            Self::MessageUser(args) => args.validate(),
        }
    }
}

impl Operation {
    /// Field name as it appears in the payload
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::CreateUserAccount(_) => "createUserAccount",
            Self::GetUserAccount(_) => "getUserAccount",
            Self::CreateGroup(_) => "createGroup",
            Self::AddUserToGroup(_) => "addUserToGroup",
            Self::SendMessage(_) => "sendMessage",
            Self::TypingIndicator(_) => "typingIndicator",
            Self::GetAllGroupsCreatedByUser(_) => "getAllGroupsCreatedByUser",
            Self::GetGroupsUserBelongsTo(_) => "getGroupsUserBelongsTo",
            Self::GetAllMessagesPerGroup(_) => "getAllMessagesPerGroup",
            Self::MessageUser(_) => "messageUser",
        }
    }

    /// Runs the operation against storage
    ///
    /// # Errors
    ///
    /// Returns an `AppError` for rejected registrations, invalid pagination
    /// tokens and storage failures
    pub async fn execute(self, services: &ChatServices) -> Result<Value, AppError> {
        match self {
            Self::CreateUserAccount(args) => {
                let user = services
                    .users
                    .register_user(UserCreateRequest {
                        username: args.username,
                        email: args.email,
                        profile_picture: args.profile_picture,
                    })
                    .await?;
                to_json(&user)
            }
            Self::GetUserAccount(args) => {
                let user = services.users.get_user(&args.username).await?;
                to_json(&user)
            }
            Self::CreateGroup(args) => {
                let group = services
                    .groups
                    .create_group(GroupCreateRequest {
                        user_id: args.user_id,
                        name: args.name,
                        group_profile_pic: args.group_profile_pic,
                        description: args.description,
                    })
                    .await?;
                to_json(&group)
            }
            Self::AddUserToGroup(args) => {
                let added = services
                    .groups
                    .add_user_to_group(MembershipCreateRequest {
                        group_id: args.group_id,
                        user_id: args.user_id,
                    })
                    .await?;
                Ok(Value::Bool(added))
            }
            Self::SendMessage(args) => {
                let message = services
                    .messages
                    .send_message(MessageCreateRequest {
                        group_id: args.group_id,
                        user_id: args.user_id,
                        message_text: args.message_text,
                    })
                    .await?;
                to_json(&message)
            }
            Self::TypingIndicator(args) => {
                let typing = services
                    .messages
                    .set_typing(TypingIndicatorRequest {
                        group_id: args.group_id,
                        user_id: args.user_id,
                        typing: args.typing,
                    })
                    .await?;
                Ok(Value::Bool(typing))
            }
            Self::GetAllGroupsCreatedByUser(args) => {
                let groups: Vec<_> = services
                    .queries
                    .groups_created_by(&args.user_id)
                    .try_collect()
                    .await?;
                to_json(&groups)
            }
            Self::GetGroupsUserBelongsTo(args) => {
                let groups = services
                    .queries
                    .groups_user_belongs_to(&args.user_id)
                    .await?;
                to_json(&groups)
            }
            Self::GetAllMessagesPerGroup(args) => {
                let start = args
                    .next_token
                    .as_deref()
                    .map(ContinuationToken::decode)
                    .transpose()?;
                let page = services
                    .queries
                    .messages_in_group_page(&args.group_id, args.limit, start)
                    .await?;
                to_json(&MessagePage {
                    items: page.items,
                    next_token: page.next.as_ref().map(ContinuationToken::encode),
                })
            }
            Self::MessageUser(args) => {
                let author = services
                    .queries
                    .author_of_message(&args.source.into())
                    .await?;
                to_json(&author)
            }
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, AppError> {
    serde_json::to_value(value).map_err(|err| {
        tracing::error!("Failed to serialize response: {err}");
        AppError::internal()
    })
}
