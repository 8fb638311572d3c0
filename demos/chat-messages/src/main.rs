use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;
use wirekit::prelude::*;

// ---------------------------------------------------------------------------
// PDUs
// ---------------------------------------------------------------------------

const PROTOCOL_VERSION: i32 = 1;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct LoginPacket {
    pub version: i32,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct UserInfo {
    pub name: String,
    pub email: String,
    pub password: String,
    pub shoe_size: i32,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ConnectedPacket {
    pub result: i32,
    pub version: i32,
    pub users: Vec<String>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct SaySomethingPacket {
    pub message: String,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct SomeoneSaidSomethingPacket {
    pub who: String,
    pub what: String,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct UserJoinedPacket {
    pub who: String,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct UserLeftPacket {
    pub who: String,
}

impl Reflect for LoginPacket {
    fn descriptor() -> &'static TypeDescriptor {
        static DESCRIPTOR: OnceLock<TypeDescriptor> = OnceLock::new();
        DESCRIPTOR.get_or_init(|| {
            TypeDescriptor::builder::<Self>("LoginPacket")
                .member("version", "protocol version of the client", field!(LoginPacket, version))
                .member("name", "user name", field!(LoginPacket, name))
                .member("password", "user password", field!(LoginPacket, password))
                .build()
        })
    }
}

impl Reflect for UserInfo {
    fn descriptor() -> &'static TypeDescriptor {
        static DESCRIPTOR: OnceLock<TypeDescriptor> = OnceLock::new();
        DESCRIPTOR.get_or_init(|| {
            TypeDescriptor::builder::<Self>("UserInfo")
                .member("name", "user name", field!(UserInfo, name))
                .member("email", "email address", field!(UserInfo, email))
                .member("password", "user password", field!(UserInfo, password))
                .member(
                    "shoe_size",
                    MemberDoc::range("shoe size (European)", 30, 50),
                    field!(UserInfo, shoe_size),
                )
                .build()
        })
    }
}

impl Reflect for ConnectedPacket {
    fn descriptor() -> &'static TypeDescriptor {
        static DESCRIPTOR: OnceLock<TypeDescriptor> = OnceLock::new();
        DESCRIPTOR.get_or_init(|| {
            TypeDescriptor::builder::<Self>("ConnectedPacket")
                .member("result", "0 on success", field!(ConnectedPacket, result))
                .member(
                    "version",
                    "protocol version of the server",
                    field!(ConnectedPacket, version),
                )
                .member("users", "users already online", field!(ConnectedPacket, users))
                .build()
        })
    }
}

impl Reflect for SaySomethingPacket {
    fn descriptor() -> &'static TypeDescriptor {
        static DESCRIPTOR: OnceLock<TypeDescriptor> = OnceLock::new();
        DESCRIPTOR.get_or_init(|| {
            TypeDescriptor::builder::<Self>("SaySomethingPacket")
                .member("message", "text to say", field!(SaySomethingPacket, message))
                .build()
        })
    }
}

impl Reflect for SomeoneSaidSomethingPacket {
    fn descriptor() -> &'static TypeDescriptor {
        static DESCRIPTOR: OnceLock<TypeDescriptor> = OnceLock::new();
        DESCRIPTOR.get_or_init(|| {
            TypeDescriptor::builder::<Self>("SomeoneSaidSomethingPacket")
                .member("who", "speaker", field!(SomeoneSaidSomethingPacket, who))
                .member("what", "text said", field!(SomeoneSaidSomethingPacket, what))
                .build()
        })
    }
}

impl Reflect for UserJoinedPacket {
    fn descriptor() -> &'static TypeDescriptor {
        static DESCRIPTOR: OnceLock<TypeDescriptor> = OnceLock::new();
        DESCRIPTOR.get_or_init(|| {
            TypeDescriptor::builder::<Self>("UserJoinedPacket")
                .member("who", "user who joined", field!(UserJoinedPacket, who))
                .build()
        })
    }
}

impl Reflect for UserLeftPacket {
    fn descriptor() -> &'static TypeDescriptor {
        static DESCRIPTOR: OnceLock<TypeDescriptor> = OnceLock::new();
        DESCRIPTOR.get_or_init(|| {
            TypeDescriptor::builder::<Self>("UserLeftPacket")
                .member("who", "user who left", field!(UserLeftPacket, who))
                .build()
        })
    }
}

/// Both ends register the same PDUs in the same order, so codes agree.
fn chat_protocol() -> Result<&'static Protocol, ProtocolError> {
    static CHAT: OnceLock<Protocol> = OnceLock::new();
    if let Some(protocol) = CHAT.get() {
        return Ok(protocol);
    }
    let protocol = Protocol::builder("chat")
        .add_pdu::<LoginPacket>()
        .add_pdu::<UserInfo>()
        .add_pdu::<ConnectedPacket>()
        .add_pdu::<SaySomethingPacket>()
        .add_pdu::<SomeoneSaidSomethingPacket>()
        .add_pdu::<UserJoinedPacket>()
        .add_pdu::<UserLeftPacket>()
        .build()?;
    Ok(CHAT.get_or_init(|| protocol))
}

// ---------------------------------------------------------------------------
// Server side
// ---------------------------------------------------------------------------

/// Everything the server can send to a client.
#[derive(Debug)]
enum Outbound {
    Connected(ConnectedPacket),
    Said(SomeoneSaidSomethingPacket),
    Joined(UserJoinedPacket),
    Left(UserLeftPacket),
}

impl Outbound {
    fn encode(&self, protocol: &Protocol, out: &mut dyn Stream) -> Result<(), ProtocolError> {
        match self {
            Self::Connected(p) => protocol.encode(p, out),
            Self::Said(p) => protocol.encode(p, out),
            Self::Joined(p) => protocol.encode(p, out),
            Self::Left(p) => protocol.encode(p, out),
        }
    }
}

#[derive(Debug, Default)]
struct ChatServer {
    current: Option<String>,
    online: Vec<String>,
    outbound: VecDeque<Outbound>,
}

impl ChatServer {
    fn login(&mut self, p: &LoginPacket) {
        if p.version != PROTOCOL_VERSION {
            tracing::warn!(client = p.version, server = PROTOCOL_VERSION, "version mismatch");
            self.outbound.push_back(Outbound::Connected(ConnectedPacket {
                result: 1,
                version: PROTOCOL_VERSION,
                users: Vec::new(),
            }));
            return;
        }
        self.outbound.push_back(Outbound::Connected(ConnectedPacket {
            result: 0,
            version: PROTOCOL_VERSION,
            users: self.online.clone(),
        }));
        self.online.push(p.name.clone());
        self.current = Some(p.name.clone());
        self.outbound.push_back(Outbound::Joined(UserJoinedPacket { who: p.name.clone() }));
    }

    fn say(&mut self, p: &SaySomethingPacket) {
        match &self.current {
            Some(who) => self.outbound.push_back(Outbound::Said(SomeoneSaidSomethingPacket {
                who: who.clone(),
                what: p.message.clone(),
            })),
            None => tracing::warn!("dropping message sent before login"),
        }
    }

    fn disconnect(&mut self) {
        if let Some(who) = self.current.take() {
            self.online.retain(|user| *user != who);
            self.outbound.push_back(Outbound::Left(UserLeftPacket { who }));
        }
    }
}

/// Decodes and dispatches every message in `wire`.
fn pump(
    protocol: &Protocol,
    table: &mut DispatchTable<'_>,
    wire: &[u8],
) -> Result<usize, WirekitError> {
    let mut input = SliceStream::new(wire);
    let mut handled = 0;
    while input.bytes_left() > 0 {
        let message = protocol.decode(4096, &mut input)?;
        match table.dispatch_message(&message) {
            Ok(()) => handled += 1,
            Err(ProtocolError::UnregisteredHandler(code)) => {
                tracing::debug!(%code, pdu = message.pdu(), "no handler, message dropped");
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(handled)
}

// ---------------------------------------------------------------------------
// Walk-through
// ---------------------------------------------------------------------------

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let protocol = chat_protocol()?;
    for (code, descriptor) in protocol.pdus() {
        tracing::info!(%code, pdu = descriptor.name(), size = descriptor.size(), "registered");
    }
    for line in UserInfo::descriptor().summary().to_string().lines() {
        tracing::debug!("{line}");
    }

    // Client → server.
    let mut uplink = GrowableStream::new();
    let login = LoginPacket {
        version: PROTOCOL_VERSION,
        name: "Jon Watte".into(),
        password: "super secret".into(),
    };
    protocol.encode(&login, &mut uplink)?;
    protocol.encode(&SaySomethingPacket { message: "hello, world".into() }, &mut uplink)?;
    tracing::info!(bytes = uplink.len(), "client sent login and one message");

    let server = RefCell::new(ChatServer {
        online: vec!["Operator".into()],
        ..ChatServer::default()
    });
    {
        let mut table = DispatchTable::new();
        table.add_handler(protocol, |p: &LoginPacket| server.borrow_mut().login(p))?;
        table.add_handler(protocol, |p: &SaySomethingPacket| server.borrow_mut().say(p))?;
        let handled = pump(protocol, &mut table, uplink.as_bytes())?;
        tracing::info!(handled, "server processed uplink");
    }
    server.borrow_mut().disconnect();

    // Server → client.
    let mut downlink = GrowableStream::new();
    for outbound in server.borrow_mut().outbound.drain(..) {
        outbound.encode(protocol, &mut downlink)?;
    }

    let mut client = DispatchTable::new();
    client.add_handler(protocol, |p: &ConnectedPacket| {
        tracing::info!(result = p.result, version = p.version, users = ?p.users, "connected");
    })?;
    client.add_handler(protocol, |p: &UserJoinedPacket| tracing::info!(who = %p.who, "joined"))?;
    client.add_handler(protocol, |p: &SomeoneSaidSomethingPacket| {
        tracing::info!(who = %p.who, what = %p.what, "said");
    })?;
    client.add_handler(protocol, |p: &UserLeftPacket| tracing::info!(who = %p.who, "left"))?;
    let handled = pump(protocol, &mut client, downlink.as_bytes())?;
    tracing::info!(handled, "client processed downlink");

    // One text record per line, the way a user database is kept on disk.
    let users = vec![
        UserInfo {
            name: "Jon Watte".into(),
            email: "jwatte@example.com".into(),
            password: "super secret".into(),
            shoe_size: 44,
        },
        UserInfo {
            name: "Operator".into(),
            email: String::new(),
            password: "root".into(),
            shoe_size: 40,
        },
    ];
    let path = std::env::temp_dir().join("chat-messages-users.txt");
    std::fs::write(&path, text::write_records(&users)?)?;
    let loaded: Vec<UserInfo> = text::read_records(&std::fs::read_to_string(&path)?)?;
    tracing::info!(path = %path.display(), count = loaded.len(), "user store reloaded");
    for user in &loaded {
        tracing::info!(record = %text::to_text(user)?, "user");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_codes() {
        let protocol = chat_protocol().unwrap();
        assert_eq!(protocol.code::<LoginPacket>().unwrap(), Code(1));
        assert_eq!(protocol.code::<UserLeftPacket>().unwrap(), Code(7));
        assert!(std::ptr::eq(protocol, chat_protocol().unwrap()));
    }

    #[test]
    fn test_login_then_say_queues_replies() {
        let mut server = ChatServer {
            online: vec!["Operator".into()],
            ..ChatServer::default()
        };
        server.login(&LoginPacket {
            version: PROTOCOL_VERSION,
            name: "ann".into(),
            password: String::new(),
        });
        server.say(&SaySomethingPacket { message: "hi".into() });
        server.disconnect();

        let kinds: Vec<_> = server
            .outbound
            .iter()
            .map(|outbound| match outbound {
                Outbound::Connected(p) => format!("connected {:?}", p.users),
                Outbound::Joined(p) => format!("joined {}", p.who),
                Outbound::Said(p) => format!("{}: {}", p.who, p.what),
                Outbound::Left(p) => format!("left {}", p.who),
            })
            .collect();
        assert_eq!(kinds, ["connected [\"Operator\"]", "joined ann", "ann: hi", "left ann"]);
        assert_eq!(server.online, ["Operator"]);
    }

    #[test]
    fn test_wrong_version_is_refused() {
        let mut server = ChatServer::default();
        server.login(&LoginPacket { version: 99, ..LoginPacket::default() });
        assert!(server.current.is_none());
        assert!(matches!(server.outbound.front(), Some(Outbound::Connected(p)) if p.result == 1));
    }

    #[test]
    fn test_outbound_queue_round_trips_through_protocol() {
        let protocol = chat_protocol().unwrap();
        let mut wire = GrowableStream::new();
        Outbound::Said(SomeoneSaidSomethingPacket { who: "a".into(), what: "b".into() })
            .encode(protocol, &mut wire)
            .unwrap();

        let seen = RefCell::new(Vec::new());
        let mut table = DispatchTable::new();
        table
            .add_handler(protocol, |p: &SomeoneSaidSomethingPacket| {
                seen.borrow_mut().push(p.clone())
            })
            .unwrap();
        assert_eq!(pump(protocol, &mut table, wire.as_bytes()).unwrap(), 1);
        drop(table);
        assert_eq!(seen.into_inner()[0].what, "b");
    }
}
