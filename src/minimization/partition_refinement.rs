//! The partition refinement scheme of Paige and Tarjan, on which all minimization entry
//! points of this crate are built.
//!
//! The engine works on dense state ids and keeps the partition in flat arrays: `order`
//! arranges all states so that every block occupies a contiguous range, `pos` is the
//! inverse permutation and a CSR-style pair of arrays stores, for every symbol and state,
//! the list of predecessors under that symbol. Blocks live in an arena and are chained
//! through index based linked lists for the block list, the worklist of pending splitters
//! and the blocks touched during a splitting pass. Splitting a block always carves out
//! the smaller half, which keeps the total running time within `O(n * k * log n)`.

use itertools::Itertools;
use tracing::{debug, trace};

use crate::math::{Bijection, Map};
use crate::prelude::*;

use super::{MinimizationError, PruningMode};

/// Handle of a [`Block`] in the arena of its [`PaigeTarjan`] instance.
type BlockIdx = u32;

/// A contiguous range of the state ordering, representing one class of the current
/// partition.
#[derive(Debug)]
struct Block {
    /// Position in the state ordering at which this block begins.
    low: u32,
    /// Position one past the last member of this block.
    high: u32,
    /// Position one past the last marked member, `None` while no member is marked.
    ptr: Option<u32>,
    /// Identifier of the block, contiguous among all live blocks.
    id: u32,
    next_block: Option<BlockIdx>,
    next_in_worklist: Option<BlockIdx>,
    next_touched: Option<BlockIdx>,
}

impl Block {
    fn size(&self) -> u32 {
        self.high - self.low
    }
}

/// Partition refinement data structure in the style of Paige and Tarjan.
///
/// An instance is obtained from one of the initializers ([`init_complete`] or
/// [`init_partial`]), refined by [`compute_coarsest_stable_partition`] and afterwards
/// turned into a quotient automaton by one of the extractors.
///
/// [`compute_coarsest_stable_partition`]: PaigeTarjan::compute_coarsest_stable_partition
#[derive(Debug)]
pub(crate) struct PaigeTarjan {
    /// Number of addressable states, including the sink if one was added.
    num_states: usize,
    num_symbols: usize,
    /// All states, arranged such that members of a block are adjacent.
    order: Vec<u32>,
    /// Position of every state in `order`.
    pos: Vec<u32>,
    /// Region boundaries into `pred_data`, one region per symbol and state plus a
    /// terminal entry. The region for symbol `i` and state `q` spans the indices
    /// `pred_ofs[i * num_states + q]` up to the following entry.
    pred_ofs: Vec<u32>,
    /// Concatenated predecessor lists.
    pred_data: Vec<u32>,
    /// The block each state currently belongs to. Stays `None` for states that were
    /// never placed, which happens only when pruning during initialization.
    block_for_state: Vec<Option<BlockIdx>>,
    blocks: Vec<Block>,
    block_list_head: Option<BlockIdx>,
    worklist_head: Option<BlockIdx>,
    worklist_tail: Option<BlockIdx>,
    touched_head: Option<BlockIdx>,
    num_blocks: u32,
}

impl PaigeTarjan {
    fn new(num_states: usize, num_symbols: usize) -> Self {
        Self {
            num_states,
            num_symbols,
            order: vec![0; num_states],
            pos: vec![0; num_states],
            pred_ofs: vec![0; num_states * num_symbols + 1],
            pred_data: vec![0; num_states * num_symbols],
            block_for_state: vec![None; num_states],
            blocks: Vec::new(),
            block_list_head: None,
            worklist_head: None,
            worklist_tail: None,
            touched_head: None,
            num_blocks: 0,
        }
    }

    /// The number of blocks in the current partition.
    pub(crate) fn num_blocks(&self) -> u32 {
        self.num_blocks
    }

    fn block(&self, idx: BlockIdx) -> &Block {
        &self.blocks[idx as usize]
    }

    /// Creates a fresh, empty block and prepends it to the block list.
    fn create_block(&mut self) -> BlockIdx {
        let idx = self.blocks.len() as BlockIdx;
        self.blocks.push(Block {
            low: 0,
            high: 0,
            ptr: None,
            id: self.num_blocks,
            next_block: self.block_list_head,
            next_in_worklist: None,
            next_touched: None,
        });
        self.num_blocks += 1;
        self.block_list_head = Some(idx);
        idx
    }

    /// Iterates over the handles of all blocks in the block list.
    fn blocks(&self) -> impl Iterator<Item = BlockIdx> + '_ {
        std::iter::successors(self.block_list_head, move |&idx| self.block(idx).next_block)
    }

    /// The state stored at the lowest position of the given block, which serves as its
    /// canonical representative.
    fn representative(&self, block: BlockIdx) -> u32 {
        self.order[self.block(block).low as usize]
    }

    /// The block the given state belongs to.
    fn block_of(&self, state: u32) -> Option<BlockIdx> {
        self.block_for_state[state as usize]
    }

    fn add_to_worklist(&mut self, block: BlockIdx) {
        match self.worklist_tail {
            Some(tail) => self.blocks[tail as usize].next_in_worklist = Some(block),
            None => self.worklist_head = Some(block),
        }
        self.worklist_tail = Some(block);
    }

    fn poll_worklist(&mut self) -> Option<BlockIdx> {
        let head = self.worklist_head?;
        self.worklist_head = self.blocks[head as usize].next_in_worklist.take();
        if self.worklist_head.is_none() {
            self.worklist_tail = None;
        }
        Some(head)
    }

    /// Fills the worklist for the refinement loop. If `add_all` is set, every block is
    /// enqueued. Otherwise all blocks except a largest one are enqueued, which suffices
    /// for stability and is what makes the Hopcroft bound work.
    pub(crate) fn init_worklist(&mut self, add_all: bool) {
        if add_all {
            let mut curr = self.block_list_head;
            while let Some(idx) = curr {
                let next = self.block(idx).next_block;
                self.blocks[idx as usize].next_in_worklist = next;
                self.worklist_tail = Some(idx);
                curr = next;
            }
            self.worklist_head = self.block_list_head;
        } else {
            let Some(mut largest) = self.block_list_head else {
                return;
            };
            let mut largest_size = self.block(largest).size();
            let mut curr = self.block(largest).next_block;
            while let Some(idx) = curr {
                let size = self.block(idx).size();
                if size > largest_size {
                    self.add_to_worklist(largest);
                    largest = idx;
                    largest_size = size;
                } else {
                    self.add_to_worklist(idx);
                }
                curr = self.block(idx).next_block;
            }
        }
    }

    /// Refines the partition until it is stable against every block on the worklist,
    /// including the blocks created by splits along the way.
    pub(crate) fn compute_coarsest_stable_partition(&mut self) {
        trace!(
            "refining initial partition with {} blocks over {} states",
            self.num_blocks,
            self.num_states
        );
        while let Some(splitter) = self.poll_worklist() {
            let low = self.block(splitter).low as usize;
            let high = self.block(splitter).high as usize;
            // the splitter itself may be split while it is being processed, so its
            // current member range is recorded before marking begins
            let members = self.order[low..high].to_vec();

            let mut pred_ofs_base = 0;
            for _ in 0..self.num_symbols {
                for &member in &members {
                    let pred_low = self.pred_ofs[pred_ofs_base + member as usize] as usize;
                    let pred_high = self.pred_ofs[pred_ofs_base + member as usize + 1] as usize;
                    for i in pred_low..pred_high {
                        self.move_left(self.pred_data[i]);
                    }
                }
                pred_ofs_base += self.num_states;
                self.process_touched();
            }
        }
        debug!("partition is stable with {} blocks", self.num_blocks);
    }

    /// Moves `state` into the marked prefix of its block, registering the block as
    /// touched if this is its first marked member.
    fn move_left(&mut self, state: u32) {
        let block_idx = self.block_for_state[state as usize]
            .expect("every recorded predecessor belongs to a block");
        let in_block_pos = self.pos[state as usize];
        let ptr = match self.blocks[block_idx as usize].ptr {
            Some(ptr) => ptr,
            None => {
                let low = self.blocks[block_idx as usize].low;
                self.blocks[block_idx as usize].next_touched = self.touched_head.replace(block_idx);
                self.blocks[block_idx as usize].ptr = Some(low);
                low
            }
        };
        if ptr > in_block_pos {
            return;
        }
        if ptr < in_block_pos {
            let displaced = self.order[ptr as usize];
            self.order[ptr as usize] = state;
            self.order[in_block_pos as usize] = displaced;
            self.pos[state as usize] = ptr;
            self.pos[displaced as usize] = in_block_pos;
        }
        self.blocks[block_idx as usize].ptr = Some(ptr + 1);
    }

    /// Splits every block that was touched during the last marking pass and resets the
    /// marks. Each new block becomes a pending splitter.
    fn process_touched(&mut self) {
        let mut curr = self.touched_head.take();
        while let Some(block_idx) = curr {
            curr = self.blocks[block_idx as usize].next_touched.take();
            if let Some(new_block) = self.split_block(block_idx) {
                self.add_to_worklist(new_block);
            }
        }
    }

    /// Splits the marked prefix off the given block, provided both the marked and the
    /// unmarked part are nonempty, and returns the handle of the newly created block.
    /// The new block receives the smaller of the two parts.
    fn split_block(&mut self, block_idx: BlockIdx) -> Option<BlockIdx> {
        let block = &mut self.blocks[block_idx as usize];
        let ptr = block.ptr.take().expect("only touched blocks are split");
        debug_assert!(ptr > block.low, "a touched block has a marked member");
        if block.high == ptr {
            return None;
        }

        let (new_low, new_high);
        if block.high - ptr > ptr - block.low {
            new_low = block.low;
            new_high = ptr;
            block.low = ptr;
        } else {
            new_low = ptr;
            new_high = block.high;
            block.high = ptr;
        }
        trace!(
            "splitting off range {new_low}..{new_high}, {} members remain",
            block.size()
        );

        let new_idx = self.blocks.len() as BlockIdx;
        let next_block = self.blocks[block_idx as usize].next_block.replace(new_idx);
        self.blocks.push(Block {
            low: new_low,
            high: new_high,
            ptr: None,
            id: self.num_blocks,
            next_block,
            next_in_worklist: None,
            next_touched: None,
        });
        self.num_blocks += 1;

        for i in new_low..new_high {
            self.block_for_state[self.order[i as usize] as usize] = Some(new_idx);
        }
        Some(new_idx)
    }

    /// Unlinks empty blocks from the block list and renumbers the remaining blocks
    /// contiguously in list order. Must not be called while splitters are pending.
    fn remove_empty_blocks(&mut self) {
        debug_assert!(self.worklist_head.is_none());
        let mut curr = self.block_list_head;
        let mut prev: Option<BlockIdx> = None;
        let mut eff_id = 0;
        while let Some(idx) = curr {
            let next = self.blocks[idx as usize].next_block;
            if self.blocks[idx as usize].size() > 0 {
                self.blocks[idx as usize].id = eff_id;
                eff_id += 1;
                match prev {
                    Some(prev) => self.blocks[prev as usize].next_block = Some(idx),
                    None => self.block_list_head = Some(idx),
                }
                prev = Some(idx);
            }
            curr = next;
        }
        match prev {
            Some(prev) => self.blocks[prev as usize].next_block = None,
            None => self.block_list_head = None,
        }
        self.num_blocks = eff_id;
    }

    /// The current partition as a family of sets of dense state ids.
    #[cfg(test)]
    pub(crate) fn partition(&self) -> crate::math::Partition<u32> {
        crate::math::Partition::new(self.blocks().map(|idx| {
            let block = self.block(idx);
            (block.low..block.high).map(|i| self.order[i as usize])
        }))
    }
}

/// Numbers the states of `ts` densely in the order produced by
/// [`TransitionSystem::state_indices`].
pub(crate) fn number_states<D: TransitionSystem>(ts: &D) -> Bijection<D::StateIndex, u32> {
    let mut numbering = Bijection::new();
    for (id, state) in ts.state_indices().enumerate() {
        numbering.insert(state, id as u32);
    }
    numbering
}

fn dense_id<Idx: IndexType>(numbering: &Bijection<Idx, u32>, state: Idx) -> u32 {
    *numbering
        .get_by_left(&state)
        .expect("every state of the input is numbered")
}

fn original_state<Idx: IndexType>(numbering: &Bijection<Idx, u32>, id: u32) -> Idx {
    *numbering
        .get_by_right(&id)
        .expect("dense ids below the state count are assigned")
}

/// Verifies that offsets into the flat arrays cannot overflow for an automaton of the
/// given dimensions. Block handles must stay below twice the state count and every
/// predecessor offset must fit into a `u32`.
fn check_dimensions(num_states: usize, num_symbols: usize) -> Result<(), MinimizationError> {
    let fits = num_states <= (u32::MAX / 2) as usize
        && num_states
            .checked_mul(num_symbols)
            .and_then(|transitions| transitions.checked_add(1))
            .is_some_and(|entries| u32::try_from(entries).is_ok());
    if fits {
        Ok(())
    } else {
        Err(MinimizationError::StateLimitExceeded(
            num_states,
            num_symbols,
        ))
    }
}

/// Turns per-region counts into end offsets by forming inclusive prefix sums. A
/// subsequent decrementing fill pass then leaves each entry at the start of its region.
fn prefix_sum(array: &mut [u32]) {
    let mut curr = 0;
    for entry in array.iter_mut() {
        curr += *entry;
        *entry = curr;
    }
}

/// Builds the initial partition for a complete automaton by grouping states according to
/// `classify`. With `prune` set, only states reachable from the initial state take part.
/// Encountering an undefined transition aborts with [`MinimizationError::Partial`].
pub(crate) fn init_complete<D, K>(
    ts: &D,
    numbering: &Bijection<D::StateIndex, u32>,
    classify: impl Fn(D::StateIndex) -> K,
    prune: bool,
) -> Result<PaigeTarjan, MinimizationError>
where
    D: Deterministic + Pointed,
    K: Color,
{
    if prune {
        init_complete_prune(ts, numbering, classify)
    } else {
        init_complete_no_prune(ts, numbering, classify)
    }
}

fn init_complete_prune<D, K>(
    ts: &D,
    numbering: &Bijection<D::StateIndex, u32>,
    classify: impl Fn(D::StateIndex) -> K,
) -> Result<PaigeTarjan, MinimizationError>
where
    D: Deterministic + Pointed,
    K: Color,
{
    let num_states = ts.size();
    let num_symbols = ts.alphabet().size();
    check_dimensions(num_states, num_symbols)?;

    let mut pt = PaigeTarjan::new(num_states, num_symbols);
    let mut block_map: Map<K, BlockIdx> = Map::default();

    let init = ts.initial();
    let init_id = dense_id(numbering, init);

    let init_block = pt.create_block();
    pt.blocks[init_block as usize].high = 1;
    pt.block_for_state[init_id as usize] = Some(init_block);
    block_map.insert(classify(init), init_block);

    let mut states_buff = vec![0; num_states];
    states_buff[0] = init_id;
    let mut states_ptr = 0;
    let mut reachable_states = 1;

    while states_ptr < reachable_states {
        let curr_id = states_buff[states_ptr];
        states_ptr += 1;
        let curr = original_state(numbering, curr_id);

        let mut pred_count_base = 0;
        for i in 0..num_symbols {
            let sym = ts.alphabet().symbol_from_index(i);
            let Some(succ) = ts.successor_index(curr, sym) else {
                return Err(MinimizationError::Partial {
                    state: format!("{curr:?}"),
                    symbol: sym.show(),
                });
            };
            let succ_id = dense_id(numbering, succ);

            if pt.block_for_state[succ_id as usize].is_none() {
                let succ_class = classify(succ);
                let succ_block = match block_map.get(&succ_class) {
                    Some(&block) => block,
                    None => {
                        let block = pt.create_block();
                        block_map.insert(succ_class, block);
                        block
                    }
                };
                pt.blocks[succ_block as usize].high += 1;
                pt.block_for_state[succ_id as usize] = Some(succ_block);
                states_buff[reachable_states] = succ_id;
                reachable_states += 1;
            }

            pt.pred_ofs[pred_count_base + succ_id as usize] += 1;
            pred_count_base += num_states;
        }
    }

    layout_blocks(&mut pt);
    prefix_sum(&mut pt.pred_ofs);

    for i in 0..reachable_states {
        let state_id = states_buff[i];
        place_state(&mut pt, state_id);

        let state = original_state(numbering, state_id);
        let mut pred_ofs_base = 0;
        for j in 0..num_symbols {
            let sym = ts.alphabet().symbol_from_index(j);
            let succ = ts
                .successor_index(state, sym)
                .expect("transitions were present during counting");
            let succ_id = dense_id(numbering, succ) as usize;
            pt.pred_ofs[pred_ofs_base + succ_id] -= 1;
            pt.pred_data[pt.pred_ofs[pred_ofs_base + succ_id] as usize] = state_id;
            pred_ofs_base += num_states;
        }
    }

    trace!(
        "initial partition has {} blocks, {} of {} states reachable",
        pt.num_blocks,
        reachable_states,
        num_states
    );
    Ok(pt)
}

fn init_complete_no_prune<D, K>(
    ts: &D,
    numbering: &Bijection<D::StateIndex, u32>,
    classify: impl Fn(D::StateIndex) -> K,
) -> Result<PaigeTarjan, MinimizationError>
where
    D: Deterministic + Pointed,
    K: Color,
{
    let num_states = ts.size();
    let num_symbols = ts.alphabet().size();
    check_dimensions(num_states, num_symbols)?;

    let mut pt = PaigeTarjan::new(num_states, num_symbols);
    let mut block_map: Map<K, BlockIdx> = Map::default();

    for id in 0..num_states as u32 {
        let state = original_state(numbering, id);
        let class = classify(state);
        let block_idx = match block_map.get(&class) {
            Some(&block) => block,
            None => {
                let block = pt.create_block();
                block_map.insert(class, block);
                block
            }
        };
        pt.blocks[block_idx as usize].high += 1;
        pt.block_for_state[id as usize] = Some(block_idx);

        let mut pred_count_base = 0;
        for i in 0..num_symbols {
            let sym = ts.alphabet().symbol_from_index(i);
            let Some(succ) = ts.successor_index(state, sym) else {
                return Err(MinimizationError::Partial {
                    state: format!("{state:?}"),
                    symbol: sym.show(),
                });
            };
            pt.pred_ofs[pred_count_base + dense_id(numbering, succ) as usize] += 1;
            pred_count_base += num_states;
        }
    }

    layout_blocks(&mut pt);
    prefix_sum(&mut pt.pred_ofs);

    for id in 0..num_states as u32 {
        place_state(&mut pt, id);

        let state = original_state(numbering, id);
        let mut pred_ofs_base = 0;
        for j in 0..num_symbols {
            let sym = ts.alphabet().symbol_from_index(j);
            let succ = ts
                .successor_index(state, sym)
                .expect("transitions were present during counting");
            let succ_id = dense_id(numbering, succ) as usize;
            pt.pred_ofs[pred_ofs_base + succ_id] -= 1;
            pt.pred_data[pt.pred_ofs[pred_ofs_base + succ_id] as usize] = id;
            pred_ofs_base += num_states;
        }
    }

    Ok(pt)
}

/// Builds the initial partition for a possibly partial automaton. All undefined
/// transitions are routed to an implicit sink state with id `n` that loops back to
/// itself on every symbol and is classified by `sink_class`. Unreachable states do not
/// take part.
pub(crate) fn init_partial<D, K>(
    ts: &D,
    numbering: &Bijection<D::StateIndex, u32>,
    classify: impl Fn(D::StateIndex) -> K,
    sink_class: K,
) -> Result<PaigeTarjan, MinimizationError>
where
    D: Deterministic + Pointed,
    K: Color,
{
    let num_symbols = ts.alphabet().size();
    let sink_id = ts.size() as u32;
    let num_states = ts.size() + 1;
    check_dimensions(num_states, num_symbols)?;

    let mut pt = PaigeTarjan::new(num_states, num_symbols);
    let mut block_map: Map<K, BlockIdx> = Map::default();

    let init = ts.initial();
    let init_id = dense_id(numbering, init);

    let init_block = pt.create_block();
    pt.blocks[init_block as usize].high = 1;
    pt.block_for_state[init_id as usize] = Some(init_block);
    block_map.insert(classify(init), init_block);

    let mut states_buff = vec![0; num_states];
    states_buff[0] = init_id;
    let mut states_ptr = 0;
    let mut reachable_states = 1;

    let mut partial = false;
    while states_ptr < reachable_states {
        let curr_id = states_buff[states_ptr];
        states_ptr += 1;
        if curr_id == sink_id {
            continue;
        }
        let curr = original_state(numbering, curr_id);

        let mut pred_count_base = 0;
        for i in 0..num_symbols {
            let sym = ts.alphabet().symbol_from_index(i);
            let succ = ts.successor_index(curr, sym);
            let succ_id = match succ {
                Some(succ) => dense_id(numbering, succ),
                None => {
                    partial = true;
                    sink_id
                }
            };

            if pt.block_for_state[succ_id as usize].is_none() {
                let succ_class = match succ {
                    Some(succ) => classify(succ),
                    None => sink_class.clone(),
                };
                let succ_block = match block_map.get(&succ_class) {
                    Some(&block) => block,
                    None => {
                        let block = pt.create_block();
                        block_map.insert(succ_class, block);
                        block
                    }
                };
                pt.blocks[succ_block as usize].high += 1;
                pt.block_for_state[succ_id as usize] = Some(succ_block);
                states_buff[reachable_states] = succ_id;
                reachable_states += 1;
            }

            pt.pred_ofs[pred_count_base + succ_id as usize] += 1;
            pred_count_base += num_states;
        }
    }

    // the sink loops back to itself on every symbol
    if partial {
        let mut pred_count_idx = sink_id as usize;
        for _ in 0..num_symbols {
            pt.pred_ofs[pred_count_idx] += 1;
            pred_count_idx += num_states;
        }
    }

    layout_blocks(&mut pt);
    prefix_sum(&mut pt.pred_ofs);

    for i in 0..reachable_states {
        let state_id = states_buff[i];
        place_state(&mut pt, state_id);

        let mut pred_ofs_base = 0;
        if state_id == sink_id {
            for _ in 0..num_symbols {
                pt.pred_ofs[pred_ofs_base + sink_id as usize] -= 1;
                pt.pred_data[pt.pred_ofs[pred_ofs_base + sink_id as usize] as usize] = sink_id;
                pred_ofs_base += num_states;
            }
        } else {
            let state = original_state(numbering, state_id);
            for j in 0..num_symbols {
                let sym = ts.alphabet().symbol_from_index(j);
                let succ_id = match ts.successor_index(state, sym) {
                    Some(succ) => dense_id(numbering, succ) as usize,
                    None => sink_id as usize,
                };
                pt.pred_ofs[pred_ofs_base + succ_id] -= 1;
                pt.pred_data[pt.pred_ofs[pred_ofs_base + succ_id] as usize] = state_id;
                pred_ofs_base += num_states;
            }
        }
    }

    pt.remove_empty_blocks();
    Ok(pt)
}

/// Lays the blocks out back to back by accumulating their member counts, which at this
/// point are stored in the `high` fields. Afterwards `low` and `high` both point at the
/// end of the block's range, from where the placement pass grows each block downwards.
fn layout_blocks(pt: &mut PaigeTarjan) {
    let mut curr_ofs = 0;
    let mut curr = pt.block_list_head;
    while let Some(idx) = curr {
        let block = &mut pt.blocks[idx as usize];
        curr_ofs += block.high;
        block.high = curr_ofs;
        block.low = curr_ofs;
        curr = block.next_block;
    }
}

/// Assigns `state_id` the next free position within the range of its block.
fn place_state(pt: &mut PaigeTarjan, state_id: u32) {
    let block_idx = pt.block_for_state[state_id as usize]
        .expect("states are assigned to blocks before placement");
    let block = &mut pt.blocks[block_idx as usize];
    block.low -= 1;
    let pos = block.low;
    pt.order[pos as usize] = state_id;
    pt.pos[state_id as usize] = pos;
}

/// Builds the quotient automaton, creating states only for blocks that are reachable
/// from the block containing the initial state. Undefined transitions of a block's
/// representative produce no edge, so the output is partial wherever the input was.
pub(crate) fn extract_pruned<D>(
    pt: &PaigeTarjan,
    ts: &D,
    numbering: &Bijection<D::StateIndex, u32>,
) -> Initialized<DTS<D::Alphabet, D::StateColor, D::EdgeColor>>
where
    D: Deterministic + Pointed,
{
    let num_blocks = pt.num_blocks() as usize;
    let mut out: DTS<D::Alphabet, D::StateColor, D::EdgeColor> =
        DTS::for_alphabet_size_hint(ts.alphabet().clone(), num_blocks);

    // blocks are represented by the state through which they were first discovered,
    // which for the block of the sink can only ever be an original state
    let mut rep_map = vec![0; num_blocks];
    let mut state_map: Vec<Option<u32>> = vec![None; num_blocks];

    let init = ts.initial();
    let init_id = dense_id(numbering, init);
    let init_color = ts.state_color(init).expect("the initial state exists");
    let res_init = out.add_state(init_color);

    let init_block = pt
        .block_of(init_id)
        .expect("the initial state is placed during initialization");
    state_map[pt.block(init_block).id as usize] = Some(res_init);
    rep_map[res_init as usize] = init_id;

    let mut states_ptr = 0usize;
    let mut num_out_states = 1usize;
    while states_ptr < num_out_states {
        let res_state = states_ptr as u32;
        states_ptr += 1;
        let rep = original_state(numbering, rep_map[res_state as usize]);

        for i in 0..pt.num_symbols {
            let sym = ts.alphabet().symbol_from_index(i);
            let Some((succ, edge_color)) = ts.transition(rep, sym) else {
                continue;
            };
            let succ_id = dense_id(numbering, succ);
            let succ_block = pt
                .block_of(succ_id)
                .expect("successors of reachable states are placed");
            let succ_block_id = pt.block(succ_block).id as usize;

            let res_succ = match state_map[succ_block_id] {
                Some(res_succ) => res_succ,
                None => {
                    let color = ts.state_color(succ).expect("the successor exists");
                    let res_succ = out.add_state(color);
                    state_map[succ_block_id] = Some(res_succ);
                    rep_map[res_succ as usize] = succ_id;
                    num_out_states += 1;
                    res_succ
                }
            };
            out.add_edge(res_state, sym, edge_color, res_succ);
        }
    }

    out.with_initial(res_init)
}

/// Builds the quotient automaton with one state per block, regardless of whether the
/// block is reachable. Output state ids coincide with block ids.
pub(crate) fn extract_unpruned<D>(
    pt: &PaigeTarjan,
    ts: &D,
    numbering: &Bijection<D::StateIndex, u32>,
) -> Initialized<DTS<D::Alphabet, D::StateColor, D::EdgeColor>>
where
    D: Deterministic + Pointed,
{
    let num_blocks = pt.num_blocks() as usize;
    let mut out: DTS<D::Alphabet, D::StateColor, D::EdgeColor> =
        DTS::for_alphabet_size_hint(ts.alphabet().clone(), num_blocks);

    let by_id = pt
        .blocks()
        .map(|idx| (pt.block(idx).id, idx))
        .sorted_unstable()
        .collect_vec();

    for &(id, block_idx) in &by_id {
        let rep = original_state(numbering, pt.representative(block_idx));
        let color = ts
            .state_color(rep)
            .expect("representatives are states of the input");
        let out_state = out.add_state(color);
        debug_assert_eq!(out_state, id);
    }

    for &(id, block_idx) in &by_id {
        let rep = original_state(numbering, pt.representative(block_idx));
        for i in 0..pt.num_symbols {
            let sym = ts.alphabet().symbol_from_index(i);
            let Some((succ, edge_color)) = ts.transition(rep, sym) else {
                continue;
            };
            let succ_block = pt
                .block_of(dense_id(numbering, succ))
                .expect("successors of placed states are placed");
            out.add_edge(id, sym, edge_color, pt.block(succ_block).id);
        }
    }

    let init_block = pt
        .block_of(dense_id(numbering, ts.initial()))
        .expect("the initial state is placed during initialization");
    out.with_initial(pt.block(init_block).id)
}

/// Runs the full minimization pipeline for a complete automaton: initial partition by
/// `classify`, refinement to stability and extraction according to `pruning`.
pub(crate) fn refine_complete<D, K>(
    ts: &D,
    classify: impl Fn(D::StateIndex) -> K,
    pruning: PruningMode,
) -> Result<Initialized<DTS<D::Alphabet, D::StateColor, D::EdgeColor>>, MinimizationError>
where
    D: Deterministic + Pointed,
    K: Color,
{
    debug!(
        "minimizing automaton with {} states over {} symbols, pruning {:?}",
        ts.size(),
        ts.alphabet().size(),
        pruning
    );
    let numbering = number_states(ts);
    let mut pt = init_complete(
        ts,
        &numbering,
        classify,
        pruning == PruningMode::PruneBefore,
    )?;
    pt.init_worklist(false);
    pt.compute_coarsest_stable_partition();

    let out = if pruning == PruningMode::PruneAfter {
        extract_pruned(&pt, ts, &numbering)
    } else {
        extract_unpruned(&pt, ts, &numbering)
    };
    debug!("quotient automaton has {} states", out.size());
    Ok(out)
}

/// Runs the full minimization pipeline for a possibly partial automaton, totalizing
/// with a sink classified by `sink_class`. Extraction always prunes, so the sink only
/// surfaces in the output if some original state turns out equivalent to it.
pub(crate) fn refine_partial<D, K>(
    ts: &D,
    classify: impl Fn(D::StateIndex) -> K,
    sink_class: K,
) -> Result<Initialized<DTS<D::Alphabet, D::StateColor, D::EdgeColor>>, MinimizationError>
where
    D: Deterministic + Pointed,
    K: Color,
{
    debug!(
        "minimizing partial automaton with {} states over {} symbols",
        ts.size(),
        ts.alphabet().size()
    );
    let numbering = number_states(ts);
    let mut pt = init_partial(ts, &numbering, classify, sink_class)?;
    pt.init_worklist(false);
    pt.compute_coarsest_stable_partition();

    let out = extract_pruned(&pt, ts, &numbering);
    debug!("quotient automaton has {} states", out.size());
    Ok(out)
}

/// The per-symbol tuple of edge colors leaving a state. States with equal signatures
/// are initially indistinguishable when minimizing by transition output.
pub(crate) fn transition_signature<D: Deterministic>(
    ts: &D,
    state: D::StateIndex,
) -> Vec<Option<D::EdgeColor>> {
    ts.alphabet()
        .universe()
        .map(|sym| ts.edge_color(state, sym))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Partition;
    use crate::tests::wiki_dfa;

    fn classified_by_acceptance(
        dfa: &DFA,
        prune: bool,
    ) -> (PaigeTarjan, Bijection<u32, u32>) {
        let numbering = number_states(dfa);
        let pt = init_complete(
            dfa,
            &numbering,
            |q| dfa.state_color(q).unwrap(),
            prune,
        )
        .unwrap();
        (pt, numbering)
    }

    fn partial_example() -> DFA {
        TSBuilder::without_edge_colors()
            .with_alphabet_symbols(['a', 'b'])
            .with_state_colors([false, true])
            .with_edges([(0, 'a', 1)])
            .into_dfa(0)
    }

    #[test]
    fn initial_partition_groups_by_classification() {
        let dfa = wiki_dfa();
        let (pt, _) = classified_by_acceptance(&dfa, false);

        assert_eq!(pt.num_blocks(), 2);
        assert_eq!(
            pt.partition(),
            Partition::new([vec![0, 1, 5], vec![2, 3, 4]])
        );
        for i in 0..pt.num_states {
            assert_eq!(pt.pos[pt.order[i] as usize] as usize, i);
        }
    }

    #[test]
    fn predecessor_regions_cover_all_transitions() {
        let dfa = wiki_dfa();
        let (pt, _) = classified_by_acceptance(&dfa, false);

        assert_eq!(*pt.pred_ofs.last().unwrap() as usize, pt.pred_data.len());
        for i in 0..pt.num_symbols {
            let sym = dfa.alphabet().symbol_from_index(i);
            for q in 0..pt.num_states {
                let low = pt.pred_ofs[i * pt.num_states + q] as usize;
                let high = pt.pred_ofs[i * pt.num_states + q + 1] as usize;
                for &p in &pt.pred_data[low..high] {
                    assert_eq!(dfa.successor_index(p, sym), Some(q as u32));
                }
            }
        }
    }

    #[test]
    fn worklist_omits_one_largest_block() {
        let dfa = wiki_dfa();
        let (mut pt, _) = classified_by_acceptance(&dfa, false);
        pt.init_worklist(false);

        let mut enqueued = 0;
        while pt.poll_worklist().is_some() {
            enqueued += 1;
        }
        assert_eq!(enqueued, pt.num_blocks() - 1);
    }

    #[test]
    fn full_worklist_enqueues_every_block() {
        let dfa = wiki_dfa();
        let (mut pt, _) = classified_by_acceptance(&dfa, false);
        pt.init_worklist(true);

        let mut enqueued = 0;
        while pt.poll_worklist().is_some() {
            enqueued += 1;
        }
        assert_eq!(enqueued, pt.num_blocks());
    }

    #[test]
    fn refinement_stabilizes_wiki_partition() {
        let dfa = wiki_dfa();
        let (mut pt, _) = classified_by_acceptance(&dfa, false);
        pt.init_worklist(false);
        pt.compute_coarsest_stable_partition();

        assert_eq!(pt.num_blocks(), 3);
        assert_eq!(
            pt.partition(),
            Partition::new([vec![0, 1], vec![2, 3, 4], vec![5]])
        );
    }

    #[test]
    fn stable_blocks_have_uniform_successor_blocks() {
        let dfa = wiki_dfa();
        let (mut pt, numbering) = classified_by_acceptance(&dfa, false);
        pt.init_worklist(false);
        pt.compute_coarsest_stable_partition();

        for block in pt.blocks().collect_vec() {
            let (low, high) = (pt.block(block).low, pt.block(block).high);
            for sym in dfa.alphabet().universe() {
                let successor_blocks = (low..high)
                    .map(|i| {
                        let member = original_state(&numbering, pt.order[i as usize]);
                        let succ = dfa.successor_index(member, sym).unwrap();
                        pt.block_of(dense_id(&numbering, succ)).unwrap()
                    })
                    .unique()
                    .collect_vec();
                assert_eq!(successor_blocks.len(), 1);
            }
        }
    }

    #[test]
    fn strict_initialization_rejects_partial_input() {
        let dfa = partial_example();
        let numbering = number_states(&dfa);
        let result = init_complete(&dfa, &numbering, |q| dfa.state_color(q).unwrap(), false);
        assert!(matches!(
            result,
            Err(MinimizationError::Partial { .. })
        ));
    }

    #[test]
    fn pruning_initialization_skips_unreachable_states() {
        // state 2 cannot be reached from 0
        let dfa = TSBuilder::without_edge_colors()
            .with_state_colors([false, true, true])
            .with_edges([
                (0, 'a', 1),
                (0, 'b', 0),
                (1, 'a', 0),
                (1, 'b', 1),
                (2, 'a', 2),
                (2, 'b', 2),
            ])
            .into_dfa(0);
        let (pt, _) = classified_by_acceptance(&dfa, true);

        assert_eq!(pt.partition(), Partition::new([vec![0], vec![1]]));
        assert_eq!(pt.block_of(2), None);
    }

    #[test]
    fn totalizing_initialization_adds_a_sink() {
        let dfa = partial_example();
        let numbering = number_states(&dfa);
        let mut pt = init_partial(
            &dfa,
            &numbering,
            |q| dfa.state_color(q).unwrap(),
            false,
        )
        .unwrap();

        // state 0 and the sink both reject, state 1 accepts
        assert_eq!(pt.num_states, 3);
        assert_eq!(pt.partition(), Partition::new([vec![0, 2], vec![1]]));

        pt.init_worklist(false);
        pt.compute_coarsest_stable_partition();
        // reading 'a' separates state 0 from the sink
        assert_eq!(
            pt.partition(),
            Partition::new([vec![0], vec![1], vec![2]])
        );

        let quotient = extract_pruned(&pt, &dfa, &numbering);
        assert_eq!(quotient.size(), 2);
        assert!(quotient.accepts("a"));
        assert!(!quotient.accepts("b"));
    }

    #[test]
    fn oversized_dimensions_are_rejected() {
        assert!(check_dimensions(64, 2).is_ok());
        assert!(check_dimensions(usize::MAX, 2).is_err());
        assert!(check_dimensions((u32::MAX / 2) as usize, 3).is_err());
    }
}
