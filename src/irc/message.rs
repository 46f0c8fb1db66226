//! Just enough of RFC 1459 to register, stay connected and talk.

/// Longest line a server accepts, CR LF included.
pub const MAX_LINE_LEN: usize = 512;

/// A line received from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub prefix: Option<String>,
    pub command: String,
    pub params: Vec<String>,
}

impl Message {
    /// Parse one line, with or without its trailing CR LF.
    ///
    /// IRCv3 tags are skipped. Returns `None` for blank lines.
    pub fn parse(line: &str) -> Option<Self> {
        let mut rest = line.trim_end_matches(['\r', '\n']);

        if rest.starts_with('@') {
            rest = rest.split_once(' ').map(|(_, r)| r).unwrap_or("");
        }
        rest = rest.trim_start_matches(' ');

        let prefix = match rest.strip_prefix(':') {
            Some(stripped) => {
                let (prefix, r) = stripped.split_once(' ').unwrap_or((stripped, ""));
                rest = r;
                Some(prefix.to_string())
            }
            None => None,
        };

        let (command, mut rest) = rest
            .trim_start_matches(' ')
            .split_once(' ')
            .unwrap_or((rest.trim_start_matches(' '), ""));
        if command.is_empty() {
            return None;
        }

        let mut params = Vec::new();
        loop {
            rest = rest.trim_start_matches(' ');
            if rest.is_empty() {
                break;
            }
            if let Some(trailing) = rest.strip_prefix(':') {
                params.push(trailing.to_string());
                break;
            }
            let (param, r) = rest.split_once(' ').unwrap_or((rest, ""));
            params.push(param.to_string());
            rest = r;
        }

        Some(Self {
            prefix,
            command: command.to_ascii_uppercase(),
            params,
        })
    }
}

fn sanitize(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}

/// Cut `text` to at most `max` bytes without splitting a character.
fn truncate(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

pub fn pass(password: &str) -> String {
    format!("PASS {}\r\n", sanitize(password))
}

pub fn nick(nickname: &str) -> String {
    format!("NICK {}\r\n", sanitize(nickname))
}

pub fn user(username: &str, realname: &str) -> String {
    format!("USER {} 0 * :{}\r\n", sanitize(username), sanitize(realname))
}

pub fn pong(token: &str) -> String {
    format!("PONG :{}\r\n", sanitize(token))
}

/// PRIVMSG line for `target`, with `text` shortened to fit one line.
pub fn privmsg(target: &str, text: &str) -> String {
    let target = sanitize(target);
    let text = sanitize(text);
    let overhead = "PRIVMSG  :\r\n".len() + target.len();
    let room = MAX_LINE_LEN.saturating_sub(overhead);
    format!("PRIVMSG {} :{}\r\n", target, truncate(&text, room))
}
