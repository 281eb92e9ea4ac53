//! Per-flow session reconstruction.
//!
//! Packets are grouped by their 5-tuple; each group accumulates the raw
//! payload bytes of its packets in arrival order. The resulting buffers are
//! what the entropy engine fingerprints, so concatenation order matters and
//! is never re-sorted.

use crate::packet::{PacketRecord, TransportProtocol};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::net::IpAddr;

/// Flow identity for a decoded packet.
///
/// Records missing any addressing field share the `Unknown` sentinel key, so
/// their bytes are attributed rather than silently dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FlowKey {
    Tuple {
        src: IpAddr,
        dst: IpAddr,
        src_port: u16,
        dst_port: u16,
        protocol: TransportProtocol,
    },
    Unknown,
}

impl FlowKey {
    /// Computes the key for `record` under the given mode.
    pub fn of(record: &PacketRecord, mode: KeyMode) -> FlowKey {
        match (
            record.src_addr,
            record.dst_addr,
            record.src_port,
            record.dst_port,
            record.transport,
        ) {
            (Some(src), Some(dst), Some(src_port), Some(dst_port), Some(protocol)) => {
                match mode {
                    KeyMode::Directional => FlowKey::Tuple {
                        src,
                        dst,
                        src_port,
                        dst_port,
                        protocol,
                    },
                    KeyMode::Canonical => {
                        // Sort the endpoint pairs so both directions of a
                        // conversation share one key.
                        if (dst, dst_port) < (src, src_port) {
                            FlowKey::Tuple {
                                src: dst,
                                dst: src,
                                src_port: dst_port,
                                dst_port: src_port,
                                protocol,
                            }
                        } else {
                            FlowKey::Tuple {
                                src,
                                dst,
                                src_port,
                                dst_port,
                                protocol,
                            }
                        }
                    }
                }
            }
            _ => FlowKey::Unknown,
        }
    }
}

impl fmt::Display for FlowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowKey::Tuple {
                src,
                dst,
                src_port,
                dst_port,
                protocol,
            } => write!(f, "{src}:{src_port} -> {dst}:{dst_port}/{protocol}"),
            FlowKey::Unknown => write!(f, "unknown"),
        }
    }
}

/// How flow keys treat direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyMode {
    /// Key by the raw 5-tuple: each direction of a conversation is its own
    /// session (directional entropy fingerprints).
    #[default]
    Directional,
    /// Sort the endpoints so both directions share one session.
    Canonical,
}

/// Payload accumulated for one flow over a single aggregation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub key: FlowKey,
    /// All payload bytes seen for this flow, concatenated in arrival order.
    pub payload: Vec<u8>,
    /// Number of packets attributed to this flow, payload-less ones included.
    pub packets: usize,
}

impl Session {
    fn new(key: FlowKey) -> Self {
        Session {
            key,
            payload: Vec::new(),
            packets: 0,
        }
    }
}

/// Single-pass reducer from packet records to per-flow sessions.
///
/// Sessions are created on the first packet for a key and never evicted; the
/// caller reads the final set once the input is exhausted. No size cap is
/// imposed here.
#[derive(Debug)]
pub struct FlowAggregator {
    mode: KeyMode,
    sessions: HashMap<FlowKey, Session>,
}

impl FlowAggregator {
    pub fn new(mode: KeyMode) -> Self {
        FlowAggregator {
            mode,
            sessions: HashMap::new(),
        }
    }

    /// Attributes one packet to its session, appending its payload bytes.
    /// A missing payload appends nothing and is not an error.
    pub fn push(&mut self, record: &PacketRecord) {
        let key = FlowKey::of(record, self.mode);
        let session = self
            .sessions
            .entry(key.clone())
            .or_insert_with(|| Session::new(key));
        session.packets += 1;
        if let Some(payload) = &record.payload {
            session.payload.extend_from_slice(payload);
        }
    }

    pub fn into_sessions(self) -> HashMap<FlowKey, Session> {
        self.sessions
    }
}

/// Aggregates an ordered packet stream into per-flow sessions.
pub fn aggregate<I>(packets: I, mode: KeyMode) -> HashMap<FlowKey, Session>
where
    I: IntoIterator<Item = PacketRecord>,
{
    let mut aggregator = FlowAggregator::new(mode);
    for record in packets {
        aggregator.push(&record);
    }
    aggregator.into_sessions()
}

/// Merges a partial session map into `into`.
///
/// Shard maps produced by [`aggregate_sharded`] are key-wise disjoint, so
/// this is a plain union there; on colliding keys payloads are appended in
/// merge order.
pub fn merge_sessions(
    into: &mut HashMap<FlowKey, Session>,
    from: HashMap<FlowKey, Session>,
) {
    for (key, session) in from {
        match into.entry(key) {
            std::collections::hash_map::Entry::Occupied(mut existing) => {
                let existing = existing.get_mut();
                existing.payload.extend_from_slice(&session.payload);
                existing.packets += session.packets;
            }
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(session);
            }
        }
    }
}

fn shard_of(key: &FlowKey, shards: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    (hasher.finish() % shards as u64) as usize
}

/// Aggregates `packets` across worker threads, sharded by flow-key hash.
///
/// Because sharding is by key, every packet of a given flow lands on the same
/// worker in original arrival order, and the per-shard maps are disjoint; the
/// merged result is byte-identical to single-threaded [`aggregate`] for any
/// shard count.
pub fn aggregate_sharded(
    packets: Vec<PacketRecord>,
    mode: KeyMode,
    shards: usize,
) -> HashMap<FlowKey, Session> {
    let shards = shards.max(1);
    if shards == 1 {
        return aggregate(packets, mode);
    }

    let mut partitions: Vec<Vec<PacketRecord>> = (0..shards).map(|_| Vec::new()).collect();
    for record in packets {
        let shard = shard_of(&FlowKey::of(&record, mode), shards);
        partitions[shard].push(record);
    }

    let partials = crossbeam::scope(|s| {
        let handles: Vec<_> = partitions
            .into_iter()
            .map(|partition| s.spawn(move |_| aggregate(partition, mode)))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("aggregation worker panicked"))
            .collect::<Vec<_>>()
    })
    .expect("aggregation scope panicked");

    let mut sessions = HashMap::new();
    for partial in partials {
        merge_sessions(&mut sessions, partial);
    }
    sessions
}
