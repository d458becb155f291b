//! Typed domain objects built by the registry.
//!
//! Every field is optional: the reply decides which sub-tags are present, and
//! an absent sub-tag leaves the field unset rather than failing the call.

use serde::Serialize;
use url::Url;

use crate::registry::{DomainShape, FieldKind, FieldSpec, FieldValues};
use crate::{Friendship, Timestamp, UserId, Value};

/// A registered object, dispatched on its tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainObject {
    /// `<user>`
    User(User),
    /// `<photo>`
    Photo(Photo),
    /// `<album>`
    Album(Album),
    /// `<friend_info>`
    FriendInfo(FriendInfo),
}

impl DomainObject {
    /// The tag this object was built from.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::User(_) => User::TAG,
            Self::Photo(_) => Photo::TAG,
            Self::Album(_) => Album::TAG,
            Self::FriendInfo(_) => FriendInfo::TAG,
        }
    }
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A member of the social graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct User {
    /// The user's id.
    pub uid: Option<UserId>,
    /// Full display name.
    pub name: Option<String>,
    /// Given name.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
    /// Profile picture, medium size.
    pub pic: Option<Url>,
    /// Profile picture, small size.
    pub pic_small: Option<Url>,
    /// Profile picture, large size.
    pub pic_big: Option<Url>,
    /// Square profile thumbnail.
    pub pic_square: Option<Url>,
    /// Free-text gender as reported by the service.
    pub sex: Option<String>,
    /// Birthday as displayed, possibly without a year.
    pub birthday: Option<String>,
    /// Structured location (city, state, country, zip) kept generic.
    pub hometown_location: Option<Box<Value>>,
    /// Current status message and its update time, kept generic.
    pub status: Option<Box<Value>>,
    /// Last profile change.
    pub profile_update_time: Option<Timestamp>,
    /// Offset from UTC in hours.
    pub timezone: Option<f64>,
    /// Free-text self description.
    pub about_me: Option<String>,
}

impl DomainShape for User {
    const TAG: &'static str = "user";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::new("uid", FieldKind::Integer),
        FieldSpec::new("name", FieldKind::Text),
        FieldSpec::new("first_name", FieldKind::Text),
        FieldSpec::new("last_name", FieldKind::Text),
        FieldSpec::new("pic", FieldKind::Url),
        FieldSpec::new("pic_small", FieldKind::Url),
        FieldSpec::new("pic_big", FieldKind::Url),
        FieldSpec::new("pic_square", FieldKind::Url),
        FieldSpec::new("sex", FieldKind::Text),
        FieldSpec::new("birthday", FieldKind::Text),
        FieldSpec::new("hometown_location", FieldKind::Value),
        FieldSpec::new("status", FieldKind::Value),
        FieldSpec::new("profile_update_time", FieldKind::Timestamp),
        FieldSpec::new("timezone", FieldKind::Float),
        FieldSpec::new("about_me", FieldKind::Text),
    ];

    fn from_fields(mut fields: FieldValues) -> Self {
        Self {
            uid: fields.user_id("uid"),
            name: fields.text("name"),
            first_name: fields.text("first_name"),
            last_name: fields.text("last_name"),
            pic: fields.url("pic"),
            pic_small: fields.url("pic_small"),
            pic_big: fields.url("pic_big"),
            pic_square: fields.url("pic_square"),
            sex: fields.text("sex"),
            birthday: fields.text("birthday"),
            hometown_location: fields.value("hometown_location").map(Box::new),
            status: fields.value("status").map(Box::new),
            profile_update_time: fields.timestamp("profile_update_time"),
            timezone: fields.float("timezone"),
            about_me: fields.text("about_me"),
        }
    }
}

impl From<User> for DomainObject {
    fn from(user: User) -> Self {
        Self::User(user)
    }
}

// ---------------------------------------------------------------------------
// Photo
// ---------------------------------------------------------------------------

/// A photo. Photo and album ids exceed 53 bits, so they stay textual.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Photo {
    /// Photo id.
    pub pid: Option<String>,
    /// Album holding the photo.
    pub aid: Option<String>,
    /// Uploader.
    pub owner: Option<UserId>,
    /// Image URL, medium size.
    pub src: Option<Url>,
    /// Image URL, thumbnail size.
    pub src_small: Option<Url>,
    /// Image URL, full size.
    pub src_big: Option<Url>,
    /// Page showing the photo.
    pub link: Option<Url>,
    /// Caption text.
    pub caption: Option<String>,
    /// Upload time.
    pub created: Option<Timestamp>,
}

impl DomainShape for Photo {
    const TAG: &'static str = "photo";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::new("pid", FieldKind::Text),
        FieldSpec::new("aid", FieldKind::Text),
        FieldSpec::new("owner", FieldKind::Integer),
        FieldSpec::new("src", FieldKind::Url),
        FieldSpec::new("src_small", FieldKind::Url),
        FieldSpec::new("src_big", FieldKind::Url),
        FieldSpec::new("link", FieldKind::Url),
        FieldSpec::new("caption", FieldKind::Text),
        FieldSpec::new("created", FieldKind::Timestamp),
    ];

    fn from_fields(mut fields: FieldValues) -> Self {
        Self {
            pid: fields.text("pid"),
            aid: fields.text("aid"),
            owner: fields.user_id("owner"),
            src: fields.url("src"),
            src_small: fields.url("src_small"),
            src_big: fields.url("src_big"),
            link: fields.url("link"),
            caption: fields.text("caption"),
            created: fields.timestamp("created"),
        }
    }
}

impl From<Photo> for DomainObject {
    fn from(photo: Photo) -> Self {
        Self::Photo(photo)
    }
}

// ---------------------------------------------------------------------------
// Album
// ---------------------------------------------------------------------------

/// A photo album.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Album {
    /// Album id.
    pub aid: Option<String>,
    /// Photo used as the cover.
    pub cover_pid: Option<String>,
    /// Album owner.
    pub owner: Option<UserId>,
    /// Album title.
    pub name: Option<String>,
    /// Creation time.
    pub created: Option<Timestamp>,
    /// Last change.
    pub modified: Option<Timestamp>,
    /// Album description.
    pub description: Option<String>,
    /// Free-text place the photos were taken.
    pub location: Option<String>,
    /// Page showing the album.
    pub link: Option<Url>,
    /// Number of photos.
    pub size: Option<u64>,
}

impl DomainShape for Album {
    const TAG: &'static str = "album";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::new("aid", FieldKind::Text),
        FieldSpec::new("cover_pid", FieldKind::Text),
        FieldSpec::new("owner", FieldKind::Integer),
        FieldSpec::new("name", FieldKind::Text),
        FieldSpec::new("created", FieldKind::Timestamp),
        FieldSpec::new("modified", FieldKind::Timestamp),
        FieldSpec::new("description", FieldKind::Text),
        FieldSpec::new("location", FieldKind::Text),
        FieldSpec::new("link", FieldKind::Url),
        FieldSpec::new("size", FieldKind::Integer),
    ];

    fn from_fields(mut fields: FieldValues) -> Self {
        Self {
            aid: fields.text("aid"),
            cover_pid: fields.text("cover_pid"),
            owner: fields.user_id("owner"),
            name: fields.text("name"),
            created: fields.timestamp("created"),
            modified: fields.timestamp("modified"),
            description: fields.text("description"),
            location: fields.text("location"),
            link: fields.url("link"),
            size: fields.count("size"),
        }
    }
}

impl From<Album> for DomainObject {
    fn from(album: Album) -> Self {
        Self::Album(album)
    }
}

// ---------------------------------------------------------------------------
// Friend info
// ---------------------------------------------------------------------------

/// One answer from `friends.areFriends`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FriendInfo {
    /// First user of the pair, as echoed by the service.
    pub uid1: Option<UserId>,
    /// Second user of the pair, as echoed by the service.
    pub uid2: Option<UserId>,
    /// `Unknown` when the flag is nil-marked or absent.
    pub are_friends: Friendship,
}

impl DomainShape for FriendInfo {
    const TAG: &'static str = "friend_info";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::new("uid1", FieldKind::Integer),
        FieldSpec::new("uid2", FieldKind::Integer),
        FieldSpec::new("are_friends", FieldKind::TriState),
    ];

    fn from_fields(mut fields: FieldValues) -> Self {
        Self {
            uid1: fields.user_id("uid1"),
            uid2: fields.user_id("uid2"),
            are_friends: fields.tri_state("are_friends").unwrap_or(Friendship::Unknown),
        }
    }
}

impl From<FriendInfo> for DomainObject {
    fn from(info: FriendInfo) -> Self {
        Self::FriendInfo(info)
    }
}
