//! Messaging and group management
//!
//! Thin wrappers over `LarkClient::call`. Each one builds an im/v1 payload,
//! sends it, and checks the envelope code.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::client::LarkClient;
use crate::error::{Error, Result};
use crate::request::ApiRequest;

const MESSAGES_PATH: &str = "/im/v1/messages";
const CHATS_PATH: &str = "/im/v1/chats";

/// `msg_type` values accepted by the send endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Text,
    Post,
    Image,
    File,
    Interactive,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Text => "text",
            MessageType::Post => "post",
            MessageType::Image => "image",
            MessageType::File => "file",
            MessageType::Interactive => "interactive",
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a chat message.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageContent {
    Text(String),
    Post(PostContent),
    Image { image_key: String },
    File { file_key: String },
    Card(MessageCard),
}

impl MessageContent {
    pub fn msg_type(&self) -> MessageType {
        match self {
            MessageContent::Text(_) => MessageType::Text,
            MessageContent::Post(_) => MessageType::Post,
            MessageContent::Image { .. } => MessageType::Image,
            MessageContent::File { .. } => MessageType::File,
            MessageContent::Card(_) => MessageType::Interactive,
        }
    }

    /// The `content` object for this message type.
    pub fn content(&self) -> Value {
        match self {
            MessageContent::Text(text) => json!({ "text": text }),
            MessageContent::Post(post) => json!(post),
            MessageContent::Image { image_key } => json!({ "image_key": image_key }),
            MessageContent::File { file_key } => json!({ "file_key": file_key }),
            MessageContent::Card(card) => card.to_value(),
        }
    }
}

/// Rich text message, one body per locale.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PostContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zh_cn: Option<PostBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub en_us: Option<PostBody>,
}

impl PostContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn zh_cn(mut self, title: impl Into<String>, content: Vec<Vec<PostElement>>) -> Self {
        self.zh_cn = Some(PostBody::new(title, content));
        self
    }

    pub fn en_us(mut self, title: impl Into<String>, content: Vec<Vec<PostElement>>) -> Self {
        self.en_us = Some(PostBody::new(title, content));
        self
    }
}

/// Title plus paragraphs; each paragraph is a line of inline elements.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostBody {
    pub title: String,
    pub content: Vec<Vec<PostElement>>,
}

impl PostBody {
    pub fn new(title: impl Into<String>, content: Vec<Vec<PostElement>>) -> Self {
        Self {
            title: title.into(),
            content,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "tag", rename_all = "snake_case")]
pub enum PostElement {
    Text { text: String },
    #[serde(rename = "a")]
    Link { text: String, href: String },
    At { user_id: String },
    Img { image_key: String },
}

impl PostElement {
    pub fn text(text: impl Into<String>) -> Self {
        PostElement::Text { text: text.into() }
    }

    pub fn link(text: impl Into<String>, href: impl Into<String>) -> Self {
        PostElement::Link {
            text: text.into(),
            href: href.into(),
        }
    }

    pub fn at(user_id: impl Into<String>) -> Self {
        PostElement::At {
            user_id: user_id.into(),
        }
    }

    pub fn image(image_key: impl Into<String>) -> Self {
        PostElement::Img {
            image_key: image_key.into(),
        }
    }
}

/// Interactive card with an optional header and plain-text blocks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageCard {
    title: Option<String>,
    texts: Vec<String>,
}

impl MessageCard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Append a plain-text block.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.texts.push(text.into());
        self
    }

    fn to_value(&self) -> Value {
        let elements: Vec<Value> = self
            .texts
            .iter()
            .map(|text| json!({ "tag": "div", "text": { "tag": "plain_text", "content": text } }))
            .collect();

        let mut card = json!({
            "config": { "wide_screen_mode": true },
            "elements": elements,
        });
        if let Some(title) = &self.title {
            card["header"] = json!({ "title": { "tag": "plain_text", "content": title } });
        }
        card
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateGroupRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub user_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ChatCreated {
    #[serde(default)]
    chat_id: String,
}

/// im/v1 message and chat endpoints, obtained from `LarkClient::messages()`.
pub struct MessageService<'a> {
    client: &'a LarkClient,
}

impl<'a> MessageService<'a> {
    pub(crate) fn new(client: &'a LarkClient) -> Self {
        Self { client }
    }

    /// Post `content` to the chat identified by `chat_id`.
    pub async fn send_message(&self, chat_id: &str, content: &MessageContent) -> Result<()> {
        // The platform wants `content` as a JSON string, not a nested object
        let encoded = serde_json::to_string(&content.content())
            .map_err(|e| Error::Encode(format!("serializing message content: {e}")))?;
        let request = ApiRequest::post(format!("{MESSAGES_PATH}?receive_id_type=chat_id")).json(
            &json!({
                "receive_id": chat_id,
                "msg_type": content.msg_type().as_str(),
                "content": encoded,
            }),
        )?;

        self.client.call_empty(request).await?;
        debug!(chat_id, msg_type = %content.msg_type(), "message sent");
        Ok(())
    }

    pub async fn send_text(&self, chat_id: &str, text: impl Into<String>) -> Result<()> {
        self.send_message(chat_id, &MessageContent::Text(text.into()))
            .await
    }

    pub async fn send_post(&self, chat_id: &str, post: PostContent) -> Result<()> {
        self.send_message(chat_id, &MessageContent::Post(post)).await
    }

    pub async fn send_image(&self, chat_id: &str, image_key: impl Into<String>) -> Result<()> {
        let content = MessageContent::Image {
            image_key: image_key.into(),
        };
        self.send_message(chat_id, &content).await
    }

    pub async fn send_file(&self, chat_id: &str, file_key: impl Into<String>) -> Result<()> {
        let content = MessageContent::File {
            file_key: file_key.into(),
        };
        self.send_message(chat_id, &content).await
    }

    pub async fn send_card(&self, chat_id: &str, card: MessageCard) -> Result<()> {
        self.send_message(chat_id, &MessageContent::Card(card)).await
    }

    pub async fn get_message(&self, message_id: &str) -> Result<Value> {
        let path = format!("{MESSAGES_PATH}/{}", urlencoding::encode(message_id));
        self.client.call(ApiRequest::get(path)).await
    }

    /// Upload an image and return its `image_key`.
    pub async fn upload_image(&self, bytes: Vec<u8>, file_name: &str) -> Result<String> {
        self.client.upload("/im/v1/images", bytes, file_name).await
    }

    /// Upload a file and return its `file_key`.
    pub async fn upload_file(&self, bytes: Vec<u8>, file_name: &str) -> Result<String> {
        self.client.upload("/im/v1/files", bytes, file_name).await
    }

    /// Create a group chat and return its `chat_id`.
    pub async fn create_group(&self, group: &CreateGroupRequest) -> Result<String> {
        let request = ApiRequest::post(CHATS_PATH).json(group)?;
        let created: ChatCreated = self.client.call(request).await?;
        if created.chat_id.is_empty() {
            return Err(Error::Decode("create group response has no chat_id".into()));
        }
        debug!(chat_id = %created.chat_id, name = %group.name, "group created");
        Ok(created.chat_id)
    }

    pub async fn get_group_info(&self, chat_id: &str) -> Result<Value> {
        let path = format!("{CHATS_PATH}/{}", urlencoding::encode(chat_id));
        self.client.call(ApiRequest::get(path)).await
    }

    pub async fn add_group_members(&self, chat_id: &str, user_ids: &[String]) -> Result<()> {
        let request = ApiRequest::post(members_path(chat_id))
            .json(&json!({ "id_list": user_ids }))?;
        self.client.call_empty(request).await
    }

    /// Remove members. An empty `user_ids` sends nothing.
    pub async fn remove_group_members(&self, chat_id: &str, user_ids: &[String]) -> Result<()> {
        if user_ids.is_empty() {
            return Ok(());
        }
        let query = user_ids
            .iter()
            .map(|id| format!("id_list={}", urlencoding::encode(id)))
            .collect::<Vec<_>>()
            .join("&");
        let request = ApiRequest::delete(format!("{}?{query}", members_path(chat_id)));
        self.client.call_empty(request).await
    }
}

fn members_path(chat_id: &str) -> String {
    format!("{CHATS_PATH}/{}/members", urlencoding::encode(chat_id))
}
