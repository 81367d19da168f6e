use gochat_types::Gender;

pub const HELP: &str = "\
/login <name> [MALE|FEMALE|OTHER]  log in (or back in) and make that client active
/as <name>                         switch the active client
/select <name>                     open the private thread with <name>
/public                            open the public lounge
/search [filter]                   filter the roster panel
/who                               list online participants
/logout                            disconnect the active client
/help                              show this text
/quit                              exit
anything else                      send to the open conversation";

/// One line of console input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { name: String, gender: Option<Gender> },
    Switch(String),
    Select(String),
    Public,
    Search(String),
    Who,
    Logout,
    Help,
    Quit,
    Send(String),
    Empty,
    /// Unknown command or missing argument; carries a usage hint.
    Invalid(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Self::Send(line.to_string());
        };

        let mut words = rest.split_whitespace();
        let verb = words.next().unwrap_or_default();
        let arg = words.next();

        match (verb, arg) {
            ("login", Some(name)) => Self::Login {
                name: name.to_string(),
                gender: words.next().map(Gender::parse),
            },
            ("login", None) => Self::Invalid("usage: /login <name> [MALE|FEMALE|OTHER]".into()),
            ("as", Some(name)) => Self::Switch(name.to_string()),
            ("as", None) => Self::Invalid("usage: /as <name>".into()),
            ("select", Some(name)) => Self::Select(name.to_string()),
            ("select", None) => Self::Invalid("usage: /select <name>".into()),
            ("public", _) => Self::Public,
            ("search", filter) => Self::Search(filter.unwrap_or_default().to_string()),
            ("who", _) => Self::Who,
            ("logout", _) => Self::Logout,
            ("help", _) => Self::Help,
            ("quit" | "exit", _) => Self::Quit,
            (other, _) => Self::Invalid(format!("unknown command /{other}, try /help")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_sent() {
        assert_eq!(
            Command::parse("  hello there "),
            Command::Send("hello there".into())
        );
        assert_eq!(Command::parse("   "), Command::Empty);
    }

    #[test]
    fn login_with_and_without_category() {
        assert_eq!(
            Command::parse("/login alice female"),
            Command::Login {
                name: "alice".into(),
                gender: Some(Gender::Female),
            }
        );
        assert_eq!(
            Command::parse("/login bob"),
            Command::Login {
                name: "bob".into(),
                gender: None,
            }
        );
        assert!(matches!(Command::parse("/login"), Command::Invalid(_)));
    }

    #[test]
    fn navigation_commands() {
        assert_eq!(Command::parse("/select bob"), Command::Select("bob".into()));
        assert_eq!(Command::parse("/as carol"), Command::Switch("carol".into()));
        assert_eq!(Command::parse("/public"), Command::Public);
        assert_eq!(Command::parse("/search ca"), Command::Search("ca".into()));
        assert_eq!(Command::parse("/search"), Command::Search(String::new()));
        assert_eq!(Command::parse("/quit"), Command::Quit);
    }

    #[test]
    fn unknown_command_is_invalid() {
        assert!(matches!(
            Command::parse("/dance"),
            Command::Invalid(hint) if hint.contains("/dance")
        ));
    }
}
