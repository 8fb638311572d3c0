//! Small PDU types shared by the unit tests.

use std::sync::OnceLock;

use wirekit_reflect::{Reflect, TypeDescriptor, field};

#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct Ping {
    pub seq: u32,
}

impl Reflect for Ping {
    fn descriptor() -> &'static TypeDescriptor {
        static DESCRIPTOR: OnceLock<TypeDescriptor> = OnceLock::new();
        DESCRIPTOR.get_or_init(|| {
            TypeDescriptor::builder::<Ping>("Ping")
                .member("seq", "sequence number", field!(Ping, seq))
                .build()
        })
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct Chat {
    pub who: String,
    pub what: String,
}

impl Reflect for Chat {
    fn descriptor() -> &'static TypeDescriptor {
        static DESCRIPTOR: OnceLock<TypeDescriptor> = OnceLock::new();
        DESCRIPTOR.get_or_init(|| {
            TypeDescriptor::builder::<Chat>("Chat")
                .member("who", "speaker", field!(Chat, who))
                .member("what", "message text", field!(Chat, what))
                .build()
        })
    }
}

/// Never registered with any test protocol.
#[derive(Debug, Default)]
pub(crate) struct Unlisted {
    pub flag: bool,
}

impl Reflect for Unlisted {
    fn descriptor() -> &'static TypeDescriptor {
        static DESCRIPTOR: OnceLock<TypeDescriptor> = OnceLock::new();
        DESCRIPTOR.get_or_init(|| {
            TypeDescriptor::builder::<Unlisted>("Unlisted")
                .member("flag", "unused", field!(Unlisted, flag))
                .build()
        })
    }
}
