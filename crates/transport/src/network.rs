// transport/src/network.rs

use crate::fees::FeeSchedule;
use crate::packet::{Delivery, Packet, ParkedPacket};
use crate::{TransportError, TransportResult};
use bridge_core::{
    Amount, BridgeResult, ChainId, MessageHandler, MessagingFee, MessagingReceipt, Origin,
    Transport, TransportOptions,
};
use bridge_crypto::{Address, Hash};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Executed packets kept whole so a relayer can repeat them
pub const RECENT_PACKETS: usize = 64;

#[derive(Debug, Default)]
struct NetworkState {
    fees: FeeSchedule,
    /// Registered endpoint address per chain
    endpoints: BTreeMap<ChainId, Address>,
    /// FIFO per (source, destination)
    queues: BTreeMap<(ChainId, ChainId), VecDeque<Packet>>,
    /// Last nonce issued per (source, destination)
    nonces: BTreeMap<(ChainId, ChainId), u64>,
    /// Guids whose handler succeeded
    executed: BTreeSet<Hash>,
    /// Last `RECENT_PACKETS` executed packets, oldest first
    recent: VecDeque<Packet>,
    parked: BTreeMap<Hash, ParkedPacket>,
    fees_collected: Amount,
}

/// Shared message bus connecting every endpoint in the process.
///
/// Cloning is cheap; all clones see the same queues. The lock is never held
/// while a handler runs, so handlers may send from inside `on_receive`.
#[derive(Debug, Clone, Default)]
pub struct LocalNetwork {
    state: Arc<Mutex<NetworkState>>,
}

impl LocalNetwork {
    pub fn new(fees: FeeSchedule) -> Self {
        let state = NetworkState {
            fees,
            ..NetworkState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Attach the endpoint for `chain_id`, returning its sending half
    pub fn register(&self, chain_id: ChainId, address: Address) -> TransportResult<LocalEndpoint> {
        let mut state = self.state.lock();
        if state.endpoints.contains_key(&chain_id) {
            return Err(TransportError::DuplicateEndpoint(chain_id));
        }
        state.endpoints.insert(chain_id, address);
        info!(chain_id, %address, "Endpoint registered");

        Ok(LocalEndpoint {
            chain_id,
            address,
            network: self.clone(),
        })
    }

    pub fn endpoint_address(&self, chain_id: ChainId) -> Option<Address> {
        self.state.lock().endpoints.get(&chain_id).copied()
    }

    pub fn fee_schedule(&self) -> FeeSchedule {
        self.state.lock().fees.clone()
    }

    pub fn quote(
        &self,
        dst_chain: ChainId,
        payload_len: usize,
        options: &TransportOptions,
    ) -> TransportResult<MessagingFee> {
        let state = self.state.lock();
        if !state.endpoints.contains_key(&dst_chain) {
            return Err(TransportError::UnknownEndpoint(dst_chain));
        }
        Ok(state.fees.quote(payload_len, options))
    }

    fn enqueue(
        &self,
        src_chain: ChainId,
        sender: Address,
        dst_chain: ChainId,
        payload: Vec<u8>,
        options: &TransportOptions,
    ) -> TransportResult<MessagingReceipt> {
        let mut state = self.state.lock();
        let receiver = *state
            .endpoints
            .get(&dst_chain)
            .ok_or(TransportError::UnknownEndpoint(dst_chain))?;
        let fee = state.fees.quote(payload.len(), options);

        let nonce = {
            let last = state.nonces.entry((src_chain, dst_chain)).or_insert(0);
            *last += 1;
            *last
        };
        let guid = Packet::compute_guid(nonce, src_chain, &sender, dst_chain, &receiver);
        let collected = &state.fees_collected + &fee.native_fee;
        state.fees_collected = collected;

        let packet = Packet {
            origin: Origin {
                src_chain,
                sender,
                nonce,
                guid,
            },
            dst_chain,
            receiver,
            payload,
            gas_limit: options.gas_limit,
        };
        debug!(src_chain, dst_chain, nonce, %guid, bytes = packet.payload.len(), "Packet queued");
        state
            .queues
            .entry((src_chain, dst_chain))
            .or_default()
            .push_back(packet);

        Ok(MessagingReceipt { guid, nonce, fee })
    }

    /// Number of packets waiting on one channel
    pub fn pending(&self, src_chain: ChainId, dst_chain: ChainId) -> usize {
        self.state
            .lock()
            .queues
            .get(&(src_chain, dst_chain))
            .map_or(0, VecDeque::len)
    }

    pub fn pending_count(&self) -> usize {
        self.state.lock().queues.values().map(VecDeque::len).sum()
    }

    /// Channels with at least one packet waiting, in (source, destination) order
    pub fn pending_pairs(&self) -> Vec<(ChainId, ChainId)> {
        self.state
            .lock()
            .queues
            .iter()
            .filter(|(_, queue)| !queue.is_empty())
            .map(|(pair, _)| *pair)
            .collect()
    }

    /// Hand the oldest packet of a channel to its destination handler
    pub fn deliver_next<H: MessageHandler>(
        &self,
        src_chain: ChainId,
        dst_chain: ChainId,
        handler: &mut H,
    ) -> Option<Delivery> {
        let packet = self
            .state
            .lock()
            .queues
            .get_mut(&(src_chain, dst_chain))
            .and_then(VecDeque::pop_front)?;
        Some(self.execute(packet, 1, handler))
    }

    /// Deliver everything currently queued towards `dst_chain`
    pub fn deliver_all_to<H: MessageHandler>(&self, dst_chain: ChainId, handler: &mut H) -> Vec<Delivery> {
        let mut deliveries = Vec::new();
        loop {
            let sources: Vec<ChainId> = self
                .pending_pairs()
                .into_iter()
                .filter(|(_, dst)| *dst == dst_chain)
                .map(|(src, _)| src)
                .collect();
            if sources.is_empty() {
                break;
            }
            for src in sources {
                if let Some(delivery) = self.deliver_next(src, dst_chain, handler) {
                    deliveries.push(delivery);
                }
            }
        }
        deliveries
    }

    /// Queue a recently executed packet again, as a relayer would on a
    /// duplicate delivery. The copy is dropped when it reaches the handler.
    pub fn redeliver(&self, guid: &Hash) -> TransportResult<()> {
        let mut state = self.state.lock();
        let packet = state
            .recent
            .iter()
            .find(|packet| packet.guid() == *guid)
            .cloned()
            .ok_or(TransportError::PacketNotFound(*guid))?;
        debug!(%guid, "Packet re-queued");
        state.queues.entry(packet.pair()).or_default().push_back(packet);
        Ok(())
    }

    pub fn parked(&self) -> Vec<ParkedPacket> {
        self.state.lock().parked.values().cloned().collect()
    }

    pub fn parked_for(&self, dst_chain: ChainId) -> Vec<Hash> {
        self.state
            .lock()
            .parked
            .values()
            .filter(|parked| parked.packet.dst_chain == dst_chain)
            .map(|parked| parked.packet.guid())
            .collect()
    }

    /// Run a parked packet through its handler again
    pub fn retry<H: MessageHandler>(
        &self,
        guid: &Hash,
        dst_chain: ChainId,
        handler: &mut H,
    ) -> TransportResult<Delivery> {
        let parked = {
            let mut state = self.state.lock();
            let expected = state
                .parked
                .get(guid)
                .map(|parked| parked.packet.dst_chain)
                .ok_or(TransportError::PacketNotFound(*guid))?;
            if expected != dst_chain {
                return Err(TransportError::WrongDestination {
                    guid: *guid,
                    expected,
                    actual: dst_chain,
                });
            }
            state
                .parked
                .remove(guid)
                .ok_or(TransportError::PacketNotFound(*guid))?
        };
        info!(%guid, attempt = parked.attempts + 1, "Retrying parked packet");
        Ok(self.execute(parked.packet, parked.attempts + 1, handler))
    }

    pub fn is_executed(&self, guid: &Hash) -> bool {
        self.state.lock().executed.contains(guid)
    }

    pub fn executed_count(&self) -> usize {
        self.state.lock().executed.len()
    }

    pub fn fees_collected(&self) -> Amount {
        self.state.lock().fees_collected.clone()
    }

    fn execute<H: MessageHandler>(&self, packet: Packet, attempts: u32, handler: &mut H) -> Delivery {
        let guid = packet.guid();
        if self.state.lock().executed.contains(&guid) {
            warn!(%guid, "Dropping replayed packet");
            return Delivery::Replayed(guid);
        }

        match handler.on_receive(&packet.origin, &packet.payload) {
            Ok(()) => {
                debug!(%guid, src_chain = packet.origin.src_chain, dst_chain = packet.dst_chain, "Packet executed");
                let mut state = self.state.lock();
                state.executed.insert(guid);
                if state.recent.len() == RECENT_PACKETS {
                    state.recent.pop_front();
                }
                state.recent.push_back(packet);
                Delivery::Executed(guid)
            }
            Err(err) => {
                let reason = err.to_string();
                warn!(%guid, attempts, %reason, "Handler failed, packet parked");
                self.state.lock().parked.insert(
                    guid,
                    ParkedPacket {
                        packet,
                        reason: reason.clone(),
                        attempts,
                    },
                );
                Delivery::Parked { guid, reason }
            }
        }
    }
}

/// Sending half bound to one chain
#[derive(Debug, Clone)]
pub struct LocalEndpoint {
    chain_id: ChainId,
    address: Address,
    network: LocalNetwork,
}

impl LocalEndpoint {
    pub fn network(&self) -> &LocalNetwork {
        &self.network
    }
}

impl Transport for LocalEndpoint {
    fn local_chain(&self) -> ChainId {
        self.chain_id
    }

    fn local_address(&self) -> Address {
        self.address
    }

    fn quote(&self, dest: ChainId, payload: &[u8], options: &TransportOptions) -> BridgeResult<MessagingFee> {
        Ok(self.network.quote(dest, payload.len(), options)?)
    }

    fn send(&mut self, dest: ChainId, payload: Vec<u8>, options: &TransportOptions) -> BridgeResult<MessagingReceipt> {
        Ok(self
            .network
            .enqueue(self.chain_id, self.address, dest, payload, options)?)
    }
}
