//! Application/worker group split for offloaded rendering, reduced to
//! a message-passing abstraction.
//!
//! A logical process group is split into an *application* role and a
//! *worker* role, joined by two directed channels with ordered,
//! reliable delivery: requests flow from the application to the
//! workers, replies flow back. Work items travel serialized with a
//! type tag; the worker side decodes them through a
//! [WorkRegistry](struct.WorkRegistry.html) and executes them in a
//! blocking request/response loop. The work-scheduling protocol built
//! on top of this boundary lives elsewhere; this module only provides
//! the wiring.

// std
use std::collections::HashMap;
// others
use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use crossbeam_channel::{unbounded, Receiver, Sender};

pub type WorkTag = u32;

pub const SHUTDOWN_TAG: WorkTag = 0_u32;
pub const PING_TAG: WorkTag = 1_u32;

/// A serialized work item as it travels between the groups.
#[derive(Debug, Clone)]
pub struct Message {
    pub tag: WorkTag,
    pub payload: Vec<u8>,
}

/// Execution context handed to work items on the worker side.
pub struct WorkerContext {
    pub rank: usize,
    pub size: usize,
    replies: Sender<Message>,
    exiting: bool,
}

impl WorkerContext {
    pub fn post_reply(&self, message: Message) {
        self.replies
            .send(message)
            .expect("application side hung up");
    }
    /// End this worker's request loop after the current item.
    pub fn shutdown(&mut self) {
        self.exiting = true;
    }
    pub fn is_exiting(&self) -> bool {
        self.exiting
    }
}

/// A unit of offloaded work. Implementations serialize themselves
/// into a tagged payload on the application side and execute on the
/// worker side, optionally posting a reply.
pub trait Work: Send {
    fn tag(&self) -> WorkTag;
    fn encode(&self, payload: &mut Vec<u8>);
    fn run(&self, ctx: &mut WorkerContext);
}

pub type WorkReader = fn(&[u8]) -> Box<dyn Work>;

/// Registry mapping type tags to payload decoders. Every tag a peer
/// may send must be registered before the worker loop starts; an
/// unknown tag is fatal, not skipped.
#[derive(Default)]
pub struct WorkRegistry {
    readers: HashMap<WorkTag, WorkReader>,
}

impl WorkRegistry {
    pub fn new() -> WorkRegistry {
        WorkRegistry {
            readers: HashMap::new(),
        }
    }
    pub fn register(&mut self, tag: WorkTag, reader: WorkReader) {
        self.readers.insert(tag, reader);
    }
    pub fn read_work(&self, message: &Message) -> Box<dyn Work> {
        match self.readers.get(&message.tag) {
            Some(reader) => reader(&message.payload),
            None => panic!("No work type registered for tag {}", message.tag),
        }
    }
}

/// Serialize `work` and post it on the request channel.
pub fn send_work(requests: &Sender<Message>, work: &dyn Work) {
    let mut payload: Vec<u8> = Vec::new();
    work.encode(&mut payload);
    requests
        .send(Message {
            tag: work.tag(),
            payload,
        })
        .expect("worker side hung up");
}

/// The application role's end of the two channels.
pub struct AppEndpoint {
    pub requests: Sender<Message>,
    pub replies: Receiver<Message>,
    pub n_workers: usize,
}

/// One worker's end of the two channels. Workers share the request
/// channel; whichever worker is idle pops the next item.
pub struct WorkerEndpoint {
    pub requests: Receiver<Message>,
    pub replies: Sender<Message>,
    pub rank: usize,
    pub size: usize,
}

/// Split a logical process group of `world_size` members into one
/// application endpoint and `world_size - 1` worker endpoints joined
/// by two directed channels. A group of one is fatal: there is no one
/// to offload to.
pub fn split_process_group(world_size: usize) -> (AppEndpoint, Vec<WorkerEndpoint>) {
    if world_size <= 1 {
        panic!(
            "No worker peers found. Told to run in offload mode, but the \
             process group has no second member to offload to. (Did you \
             forget to launch with --workers?)"
        );
    }
    let (request_tx, request_rx) = unbounded::<Message>();
    let (reply_tx, reply_rx) = unbounded::<Message>();
    let n_workers: usize = world_size - 1;
    let workers: Vec<WorkerEndpoint> = (0..n_workers)
        .map(|rank| WorkerEndpoint {
            requests: request_rx.clone(),
            replies: reply_tx.clone(),
            rank,
            size: n_workers,
        })
        .collect();
    let app: AppEndpoint = AppEndpoint {
        requests: request_tx,
        replies: reply_rx,
        n_workers,
    };
    (app, workers)
}

/// Blocking request loop run by each worker: receive, decode through
/// the registry, execute, repeat -- until a work item shuts the
/// worker down or the application side disconnects.
pub fn run_worker(registry: &WorkRegistry, endpoint: &WorkerEndpoint) {
    let mut ctx: WorkerContext = WorkerContext {
        rank: endpoint.rank,
        size: endpoint.size,
        replies: endpoint.replies.clone(),
        exiting: false,
    };
    while let Ok(message) = endpoint.requests.recv() {
        let work: Box<dyn Work> = registry.read_work(&message);
        work.run(&mut ctx);
        if ctx.is_exiting() {
            break;
        }
    }
}

/// Ends one worker's request loop.
pub struct ShutdownWork {}

impl Work for ShutdownWork {
    fn tag(&self) -> WorkTag {
        SHUTDOWN_TAG
    }
    fn encode(&self, _payload: &mut Vec<u8>) {}
    fn run(&self, ctx: &mut WorkerContext) {
        ctx.shutdown();
    }
}

fn read_shutdown(_payload: &[u8]) -> Box<dyn Work> {
    Box::new(ShutdownWork {})
}

/// Round-trip probe: the worker echoes the value back together with
/// its rank. Used to check the group wiring after a split.
pub struct PingWork {
    pub value: u32,
}

impl Work for PingWork {
    fn tag(&self) -> WorkTag {
        PING_TAG
    }
    fn encode(&self, payload: &mut Vec<u8>) {
        payload
            .write_u32::<LittleEndian>(self.value)
            .expect("payload write");
    }
    fn run(&self, ctx: &mut WorkerContext) {
        let mut payload: Vec<u8> = Vec::new();
        payload
            .write_u32::<LittleEndian>(self.value)
            .expect("payload write");
        payload
            .write_u32::<LittleEndian>(ctx.rank as u32)
            .expect("payload write");
        ctx.post_reply(Message {
            tag: PING_TAG,
            payload,
        });
    }
}

fn read_ping(payload: &[u8]) -> Box<dyn Work> {
    Box::new(PingWork {
        value: LittleEndian::read_u32(&payload[0..4]),
    })
}

/// Register the built-in work types every worker understands.
pub fn register_default_works(registry: &mut WorkRegistry) {
    registry.register(SHUTDOWN_TAG, read_shutdown);
    registry.register(PING_TAG, read_ping);
}
