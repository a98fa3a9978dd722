use serde::{Deserialize, Serialize};

/// Member privilege rank. Ordering matters: `Board` and above may perform
/// club-management operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Member,
    Board,
    President,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Board => "board",
            Role::President => "president",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "member" => Some(Role::Member),
            "board" => Some(Role::Board),
            "president" => Some(Role::President),
            _ => None,
        }
    }

    /// Board members and the president may manage club content.
    pub fn is_board(&self) -> bool {
        *self >= Role::Board
    }
}

/// Board post category. `Notice` posts are numbered and unbounded; `About`
/// and `Rules` are singleton pages with at most one live row each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    Notice,
    About,
    Rules,
}

impl PostKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostKind::Notice => "notice",
            PostKind::About => "about",
            PostKind::Rules => "rules",
        }
    }

    pub fn parse(s: &str) -> Option<PostKind> {
        match s {
            "notice" => Some(PostKind::Notice),
            "about" => Some(PostKind::About),
            "rules" => Some(PostKind::Rules),
            _ => None,
        }
    }

    pub fn is_singleton(&self) -> bool {
        !matches!(self, PostKind::Notice)
    }
}

/// How a post is addressed: singleton pages by kind, notices by their
/// auto-assigned sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostRef {
    Singleton(PostKind),
    Numbered(i64),
}

/// The club-information record. Stored as key/value rows and re-materialized
/// into this fixed schema on read; updates always rewrite the full set, so
/// the stored key set never drifts from these field names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClubInformation {
    pub address: Option<String>,
    pub email: Option<String>,
    pub president_name: Option<String>,
    pub president_phone: Option<String>,
    pub join_url: Option<String>,
    pub regular_meeting: Option<String>,
}

impl ClubInformation {
    pub const FIELDS: [&'static str; 6] = [
        "address",
        "email",
        "president_name",
        "president_phone",
        "join_url",
        "regular_meeting",
    ];

    pub fn get(&self, key: &str) -> Option<&str> {
        let field = match key {
            "address" => &self.address,
            "email" => &self.email,
            "president_name" => &self.president_name,
            "president_phone" => &self.president_phone,
            "join_url" => &self.join_url,
            "regular_meeting" => &self.regular_meeting,
            _ => return None,
        };
        field.as_deref()
    }

    /// Sets a field by name; keys outside the schema are discarded.
    pub fn set(&mut self, key: &str, value: Option<String>) {
        match key {
            "address" => self.address = value,
            "email" => self.email = value,
            "president_name" => self.president_name = value,
            "president_phone" => self.president_phone = value,
            "join_url" => self.join_url = value,
            "regular_meeting" => self.regular_meeting = value,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_ranking() {
        assert!(Role::President.is_board());
        assert!(Role::Board.is_board());
        assert!(!Role::Member.is_board());
        assert!(Role::President > Role::Board);
    }

    #[test]
    fn role_round_trip() {
        for role in [Role::Member, Role::Board, Role::President] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("admin"), None);
    }

    #[test]
    fn singleton_kinds() {
        assert!(PostKind::About.is_singleton());
        assert!(PostKind::Rules.is_singleton());
        assert!(!PostKind::Notice.is_singleton());
    }

    #[test]
    fn club_information_ignores_unknown_keys() {
        let mut info = ClubInformation::default();
        info.set("address", Some("student hall 201".into()));
        info.set("secret_token", Some("should vanish".into()));

        assert_eq!(info.get("address"), Some("student hall 201"));
        assert_eq!(info.get("secret_token"), None);
    }
}
