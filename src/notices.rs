//! Texts posted to the group and to the audit chat.

use crate::messenger::MemberProfile;
use teloxide::types::{ChatId, UserId};

/// Placeholder replaced with the member's mention in the welcome text.
pub const MENTION_PLACEHOLDER: &str = "{mention}";

pub const DEFAULT_WELCOME: &str = "欢迎 {mention} 👋、大家加入，想聊或着分享什么都可以，视频，旅游";

pub const DEFAULT_RULES: &str = "\
🔞只限男孩子

📌入群请先发张或自己的身材吊照！

📌不要刪，不要撤，方便管理员检查。

📌脸照一张！（管理员审核

📌自我介绍
称呼：
年龄：
地区：
高/重：
角色：
1号发屌照一张
0号发屁股照一张
（4小时无完成以会自动被退出群）";

/// `@username` when the member has one, their display name otherwise.
pub fn mention(profile: &MemberProfile) -> String {
    match &profile.username {
        Some(username) => format!("@{}", username),
        None => profile.display_name.clone(),
    }
}

/// Username if known, else the numeric id. Used where no display name exists.
pub fn handle_or_id(username: Option<&str>, user: UserId) -> String {
    username
        .map(str::to_string)
        .unwrap_or_else(|| user.0.to_string())
}

pub fn welcome(template: &str, rules: &str, profile: &MemberProfile) -> String {
    let greeting = template.replace(MENTION_PLACEHOLDER, &mention(profile));
    if rules.is_empty() {
        greeting
    } else {
        format!("{}\n\n{}", greeting, rules)
    }
}

pub fn verified(username: Option<&str>) -> String {
    match username {
        Some(username) => format!("@{}，你已通过验证！", username),
        None => "你的验证已通过！".to_string(),
    }
}

pub fn removed(handle: &str) -> String {
    format!("@{}，你因为未通过验证而被踢出群聊。", handle)
}

pub fn joined_log(profile: &MemberProfile, chat: ChatId) -> String {
    let who = profile
        .username
        .as_deref()
        .unwrap_or(&profile.display_name);
    format!("New member @{} joined the group {}.", who, chat.0)
}

pub fn removed_log(handle: &str) -> String {
    format!("User @{} was kicked out due to verification timeout.", handle)
}

pub fn verified_log(handle: &str) -> String {
    format!("User @{} has been verified successfully.", handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> MemberProfile {
        MemberProfile::new("Alice", Some("alice".to_string()))
    }

    fn nameless() -> MemberProfile {
        MemberProfile::new("Bob", None)
    }

    #[test]
    fn test_mention_prefers_username() {
        assert_eq!(mention(&alice()), "@alice");
        assert_eq!(mention(&nameless()), "Bob");
    }

    #[test]
    fn test_welcome_fills_mention_and_appends_rules() {
        let text = welcome("hi {mention}!", "be nice", &alice());
        assert_eq!(text, "hi @alice!\n\nbe nice");

        let text = welcome("hi {mention}!", "", &nameless());
        assert_eq!(text, "hi Bob!");
    }

    #[test]
    fn test_default_welcome_mentions_member() {
        let text = welcome(DEFAULT_WELCOME, DEFAULT_RULES, &alice());
        assert!(text.starts_with("欢迎 @alice 👋"));
        assert!(text.contains("4小时"));
    }

    #[test]
    fn test_verified_with_and_without_username() {
        assert_eq!(verified(Some("alice")), "@alice，你已通过验证！");
        assert_eq!(verified(None), "你的验证已通过！");
    }

    #[test]
    fn test_handle_or_id_falls_back_to_id() {
        assert_eq!(handle_or_id(Some("alice"), UserId(42)), "alice");
        assert_eq!(handle_or_id(None, UserId(42)), "42");
        assert_eq!(removed("42"), "@42，你因为未通过验证而被踢出群聊。");
    }

    #[test]
    fn test_audit_lines() {
        assert_eq!(
            joined_log(&nameless(), ChatId(-100)),
            "New member @Bob joined the group -100."
        );
        assert_eq!(
            removed_log("alice"),
            "User @alice was kicked out due to verification timeout."
        );
        assert_eq!(
            verified_log("42"),
            "User @42 has been verified successfully."
        );
    }
}
