use barrage_frame::{Fields, TYPE_KEY};
use serde::{Serialize, Serializer};

/// Message type: login request (client → server).
pub const TYPE_LOGIN_REQUEST: &str = "loginreq";
/// Message type: login acknowledged (server → client).
pub const TYPE_LOGIN_RESPONSE: &str = "loginres";
/// Message type: join the room's barrage group (client → server).
pub const TYPE_JOIN_GROUP: &str = "joingroup";
/// Message type: chat/barrage message.
pub const TYPE_CHAT: &str = "chatmsg";
/// Message type: a viewer entered the room.
pub const TYPE_USER_ENTER: &str = "uenter";
/// Message type: keep-alive heartbeat (client → server).
pub const TYPE_HEARTBEAT: &str = "mrkl";

/// Group id asking the server for the full, unsampled barrage feed.
pub const DEFAULT_GROUP_ID: &str = "-9999";

const ROOM_ID_KEY: &str = "roomid";
const RID_KEY: &str = "rid";
const GID_KEY: &str = "gid";

/// A decoded barrage message, classified by its `type` field.
///
/// Field-carrying variants keep the raw map untouched so any undocumented
/// fields reach subscribers as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// `{type: loginreq, roomid}`.
    LoginRequest { room_id: String },
    /// `type = loginres`.
    LoginResponse(Fields),
    /// `{type: joingroup, rid, gid}`.
    JoinGroup { room_id: String, group_id: String },
    /// `type = chatmsg`.
    Chat(Fields),
    /// `type = uenter`.
    UserEnter(Fields),
    /// `{type: mrkl}`.
    Heartbeat,
    /// Anything else, including messages without a `type`.
    Other(Fields),
}

impl Message {
    /// Build a login request for `room_id`.
    pub fn login_request(room_id: impl Into<String>) -> Self {
        Self::LoginRequest {
            room_id: room_id.into(),
        }
    }

    /// Build a join-group request.
    pub fn join_group(room_id: impl Into<String>, group_id: impl Into<String>) -> Self {
        Self::JoinGroup {
            room_id: room_id.into(),
            group_id: group_id.into(),
        }
    }

    /// Classify a decoded field map.
    ///
    /// Client-side message types only map to their typed variants when the
    /// map carries exactly their keys; otherwise they fall back to
    /// [`Message::Other`] so no field is lost.
    pub fn from_fields(fields: Fields) -> Self {
        let kind = fields.get(TYPE_KEY).map(String::as_str).unwrap_or_default();
        match kind {
            TYPE_LOGIN_RESPONSE => Self::LoginResponse(fields),
            TYPE_CHAT => Self::Chat(fields),
            TYPE_USER_ENTER => Self::UserEnter(fields),
            TYPE_LOGIN_REQUEST if has_exact_keys(&fields, &[ROOM_ID_KEY]) => {
                Self::LoginRequest {
                    room_id: fields[ROOM_ID_KEY].clone(),
                }
            }
            TYPE_JOIN_GROUP if has_exact_keys(&fields, &[RID_KEY, GID_KEY]) => Self::JoinGroup {
                room_id: fields[RID_KEY].clone(),
                group_id: fields[GID_KEY].clone(),
            },
            TYPE_HEARTBEAT if has_exact_keys(&fields, &[]) => Self::Heartbeat,
            _ => Self::Other(fields),
        }
    }

    /// The field map this message encodes to.
    pub fn to_fields(&self) -> Fields {
        match self {
            Self::LoginRequest { room_id } => typed_fields(
                TYPE_LOGIN_REQUEST,
                &[(ROOM_ID_KEY, room_id.as_str())],
            ),
            Self::JoinGroup { room_id, group_id } => typed_fields(
                TYPE_JOIN_GROUP,
                &[(RID_KEY, room_id.as_str()), (GID_KEY, group_id.as_str())],
            ),
            Self::Heartbeat => typed_fields(TYPE_HEARTBEAT, &[]),
            Self::LoginResponse(fields)
            | Self::Chat(fields)
            | Self::UserEnter(fields)
            | Self::Other(fields) => fields.clone(),
        }
    }

    /// The protocol `type` of this message (empty if an `Other` has none).
    pub fn type_name(&self) -> &str {
        match self {
            Self::LoginRequest { .. } => TYPE_LOGIN_REQUEST,
            Self::LoginResponse(_) => TYPE_LOGIN_RESPONSE,
            Self::JoinGroup { .. } => TYPE_JOIN_GROUP,
            Self::Chat(_) => TYPE_CHAT,
            Self::UserEnter(_) => TYPE_USER_ENTER,
            Self::Heartbeat => TYPE_HEARTBEAT,
            Self::Other(fields) => fields.get(TYPE_KEY).map(String::as_str).unwrap_or_default(),
        }
    }

    /// Borrow the raw field map of an inbound message.
    pub fn fields(&self) -> Option<&Fields> {
        match self {
            Self::LoginResponse(fields)
            | Self::Chat(fields)
            | Self::UserEnter(fields)
            | Self::Other(fields) => Some(fields),
            _ => None,
        }
    }

    /// Look up one field of an inbound message.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields()?.get(key).map(String::as_str)
    }
}

impl From<Fields> for Message {
    fn from(fields: Fields) -> Self {
        Self::from_fields(fields)
    }
}

impl Serialize for Message {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.to_fields())
    }
}

fn typed_fields(kind: &str, pairs: &[(&str, &str)]) -> Fields {
    let mut fields = Fields::new();
    fields.insert(TYPE_KEY.to_string(), kind.to_string());
    for (key, value) in pairs {
        fields.insert((*key).to_string(), (*value).to_string());
    }
    fields
}

fn has_exact_keys(fields: &Fields, keys: &[&str]) -> bool {
    fields.len() == keys.len() + 1 && keys.iter().all(|key| fields.contains_key(*key))
}
