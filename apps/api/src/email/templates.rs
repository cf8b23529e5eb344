use super::OutgoingEmail;

pub fn welcome(to: &str, name: &str, role: &str) -> OutgoingEmail {
    OutgoingEmail {
        to: to.to_string(),
        subject: "Welcome to Launchpad".to_string(),
        body: format!(
            "Hi {name},\n\n\
             Your {role} account is ready. Sign in to build your profile, \
             upload a resume and start your career plan.\n\n\
             The Launchpad team"
        ),
    }
}

pub fn password_reset(to: &str, name: &str, reset_url: &str, ttl_minutes: u64) -> OutgoingEmail {
    OutgoingEmail {
        to: to.to_string(),
        subject: "Reset your Launchpad password".to_string(),
        body: format!(
            "Hi {name},\n\n\
             Someone asked to reset the password for this account. \
             Use the link below within {ttl_minutes} minutes:\n\n\
             {reset_url}\n\n\
             If this wasn't you, ignore this email.\n\n\
             The Launchpad team"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_email_contains_link_and_ttl() {
        let email = password_reset("a@b.co", "Ana", "https://x/reset?token=t", 60);
        assert_eq!(email.to, "a@b.co");
        assert!(email.body.contains("https://x/reset?token=t"));
        assert!(email.body.contains("60 minutes"));
    }

    #[test]
    fn test_welcome_mentions_role() {
        let email = welcome("a@b.co", "Ana", "college");
        assert!(email.body.contains("college account"));
    }
}
