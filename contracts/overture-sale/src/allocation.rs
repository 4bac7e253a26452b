//! Random assignment of token ids from a shrinking pool.
//!
//! A pool covers the ids `(lower_bound, upper_bound]` of one slot. Drawn
//! positions are filled with the last live id, so the live range is always
//! `0..remaining` and a position never offers an id twice. Positions that
//! were never overwritten map to `lower_bound + position + 1`, which keeps
//! the backing store sparse.
use concordium_std::*;
use core::convert::TryFrom;
use core::num::NonZeroU32;
use overture_commons::{ContractResult, CustomContractError, TokenId};

/// Unsigned 256-bit random value, big-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomValue(pub [u8; 32]);

impl RandomValue {
    pub fn from_u128(value: u128) -> Self {
        let mut bytes = [0u8; 32];
        bytes[16..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }

    /// Exact remainder of the full value.
    pub fn rem(&self, modulus: NonZeroU32) -> u32 {
        let modulus = u64::from(modulus.get());
        self.0
            .iter()
            .fold(0u64, |acc, byte| (acc * 256 + u64::from(*byte)) % modulus) as u32
    }
}

impl Serial for RandomValue {
    fn serial<W: Write>(&self, out: &mut W) -> Result<(), W::Err> {
        for byte in self.0.iter() {
            out.write_u8(*byte)?;
        }
        Ok(())
    }
}

impl Deserial for RandomValue {
    fn deserial<R: Read>(source: &mut R) -> ParseResult<Self> {
        let mut bytes = [0u8; 32];
        for byte in bytes.iter_mut() {
            *byte = source.read_u8()?;
        }
        Ok(Self(bytes))
    }
}

impl SchemaType for RandomValue {
    fn get_type() -> schema::Type {
        schema::Type::Array(32, Box::new(schema::Type::U8))
    }
}

/// Id range of the active slot and the number of ids not drawn yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, SchemaType)]
pub struct PoolBounds {
    pub lower_bound: u32,
    pub upper_bound: u32,
    pub remaining: u32,
}

impl PoolBounds {
    pub fn new(lower_bound: u32, upper_bound: u32) -> Self {
        Self {
            lower_bound,
            upper_bound,
            remaining: upper_bound.saturating_sub(lower_bound),
        }
    }

    pub fn size(&self) -> u32 {
        self.upper_bound.saturating_sub(self.lower_bound)
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }
}

/// Sparse `position -> id` overrides of a pool.
pub trait SlotStore {
    fn slot(&self, position: u32) -> Option<u32>;
    fn set_slot(&mut self, position: u32, token: u32);
    fn clear_slot(&mut self, position: u32);
}

impl<S: HasStateApi> SlotStore for StateMap<u32, u32, S> {
    fn slot(&self, position: u32) -> Option<u32> {
        self.get(&position).map(|token| *token)
    }

    fn set_slot(&mut self, position: u32, token: u32) {
        self.insert(position, token);
    }

    fn clear_slot(&mut self, position: u32) {
        self.remove(&position);
    }
}

/// Mutable view over the pool bounds and their override store.
pub struct TokenPool<'a, T> {
    bounds: &'a mut PoolBounds,
    slots: &'a mut T,
}

impl<'a, T: SlotStore> TokenPool<'a, T> {
    pub fn new(bounds: &'a mut PoolBounds, slots: &'a mut T) -> Self {
        Self { bounds, slots }
    }

    pub fn remaining(&self) -> u32 {
        self.bounds.remaining
    }

    fn token_at(&self, position: u32) -> u32 {
        self.slots
            .slot(position)
            .unwrap_or(self.bounds.lower_bound + position + 1)
    }

    /// Removes the id at `position`, which must be below `remaining`.
    fn take(&mut self, position: u32) -> ContractResult<TokenId> {
        let last = self
            .bounds
            .remaining
            .checked_sub(1)
            .ok_or(CustomContractError::ExhaustedPool)?;
        let token = self.token_at(position);
        if position != last {
            let tail = self.token_at(last);
            self.slots.set_slot(position, tail);
        }
        self.slots.clear_slot(last);
        self.bounds.remaining = last;

        Ok(TokenId(token))
    }

    /// Draws one id for a single buyer. No walk state is kept since every buyer
    /// brings a fresh random value.
    pub fn draw_single(&mut self, value: &RandomValue) -> ContractResult<TokenId> {
        let size =
            NonZeroU32::new(self.bounds.remaining).ok_or(CustomContractError::ExhaustedPool)?;
        self.take(value.rem(size))
    }
}

/// Walk state of one batch seed, persisted between batch calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, SchemaType)]
pub struct SeedState {
    pub value: RandomValue,
    pub incrementor: u32,
    /// Number of ids drawn with this seed so far.
    pub steps: u32,
    /// Queue length when the seed arrived. Entries queued later wait for the next seed.
    pub queue_end: u32,
}

impl SeedState {
    pub fn new(value: RandomValue, slot_size: u32, queue_end: u32) -> Self {
        Self {
            value,
            incrementor: derive_incrementor(&value, slot_size),
            steps: 0,
            queue_end,
        }
    }

    /// `(value + steps * incrementor) mod pool_size`, computed without overflow.
    fn position(&self, pool_size: NonZeroU32) -> u32 {
        let modulus = u64::from(pool_size.get());
        let base = u64::from(self.value.rem(pool_size));
        let walk = (u64::from(self.steps) % modulus) * (u64::from(self.incrementor) % modulus)
            % modulus;
        ((base + walk) % modulus) as u32
    }
}

/// Odd walk step derived from the seed modulo the smallest prime above the slot size.
///
/// A seed one below the prime would become the prime itself after the odd
/// adjustment, which is a zero step; that case falls back to 1.
pub fn derive_incrementor(value: &RandomValue, slot_size: u32) -> u32 {
    let modulus = match NonZeroU32::new(smallest_prime_above(slot_size)) {
        Some(modulus) => modulus,
        None => return 1,
    };
    let base = value.rem(modulus);
    let step = if base % 2 == 0 { base + 1 } else { base };
    if step % modulus.get() == 0 {
        1
    } else {
        step
    }
}

pub fn smallest_prime_above(n: u32) -> u32 {
    let mut candidate = n.saturating_add(1).max(2);
    while !is_prime(candidate) && candidate < u32::MAX {
        candidate += 1;
    }
    candidate
}

fn is_prime(n: u32) -> bool {
    if n < 2 {
        return false;
    }
    let n = u64::from(n);
    let mut divisor = 2u64;
    while divisor * divisor <= n {
        if n % divisor == 0 {
            return false;
        }
        divisor += 1;
    }
    true
}

/// A beneficiary and the number of ids it is owed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Draw<B> {
    pub beneficiary: B,
    pub count: u32,
}

/// Result of one bounded allocation call.
#[derive(Debug, PartialEq, Eq)]
pub struct Allocation<B> {
    pub assigned: Vec<(B, TokenId)>,
    /// Flattened unit index to resume from.
    pub next_index: u32,
}

/// Assigns ids to the units of `draws`, starting at the flattened unit
/// `start_index` and processing at most `max_units`.
///
/// The whole call is rejected before any draw when the pool cannot cover
/// the units it would process.
pub fn allocate<B: Copy, T: SlotStore>(
    pool: &mut TokenPool<T>,
    seed: Option<&mut SeedState>,
    draws: &[Draw<B>],
    start_index: u32,
    max_units: u32,
) -> ContractResult<Allocation<B>> {
    let seed = seed.ok_or(CustomContractError::RandomnessNotReady)?;
    ensure!(pool.remaining() > 0, CustomContractError::ExhaustedPool);

    let total: u64 = draws.iter().map(|draw| u64::from(draw.count)).sum();
    let units = total
        .saturating_sub(u64::from(start_index))
        .min(u64::from(max_units));
    ensure!(
        units <= u64::from(pool.remaining()),
        CustomContractError::ExhaustedPool
    );

    let start = u64::from(start_index);
    let end = start + units;
    let mut assigned = Vec::with_capacity(units as usize);
    let mut offset = 0u64;
    for draw in draws {
        let draw_end = offset + u64::from(draw.count);
        for _ in offset.max(start)..draw_end.min(end) {
            let size =
                NonZeroU32::new(pool.remaining()).ok_or(CustomContractError::ExhaustedPool)?;
            let token = pool.take(seed.position(size))?;
            seed.steps = seed.steps.saturating_add(1);
            assigned.push((draw.beneficiary, token));
        }
        if draw_end >= end {
            break;
        }
        offset = draw_end;
    }

    let next_index = u32::try_from(end).map_err(|_| CustomContractError::Overflow)?;
    Ok(Allocation {
        assigned,
        next_index,
    })
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use concordium_std::test_infrastructure::*;
    use std::collections::{BTreeMap, BTreeSet};

    impl SlotStore for BTreeMap<u32, u32> {
        fn slot(&self, position: u32) -> Option<u32> {
            self.get(&position).copied()
        }

        fn set_slot(&mut self, position: u32, token: u32) {
            self.insert(position, token);
        }

        fn clear_slot(&mut self, position: u32) {
            self.remove(&position);
        }
    }

    fn seed(value: u128, slot_size: u32) -> SeedState {
        SeedState::new(RandomValue::from_u128(value), slot_size, 0)
    }

    fn ids(allocation: &Allocation<u8>) -> Vec<u32> {
        allocation.assigned.iter().map(|(_, token)| token.0).collect()
    }

    fn draw_all(bounds: PoolBounds, mut seed: SeedState, chunk: u32) -> Vec<u32> {
        let mut bounds = bounds;
        let mut slots = BTreeMap::new();
        let mut pool = TokenPool::new(&mut bounds, &mut slots);
        let draws = [Draw {
            beneficiary: 0u8,
            count: pool.remaining(),
        }];
        let mut next = 0;
        let mut result = Vec::new();
        while pool.remaining() > 0 {
            let allocation = allocate(&mut pool, Some(&mut seed), &draws, next, chunk)
                .expect_report("Allocation failed");
            result.extend(ids(&allocation));
            next = allocation.next_index;
        }
        result
    }

    #[concordium_test]
    fn test_seed_42_first_draws() {
        let mut bounds = PoolBounds::new(0, 1000);
        let mut slots = BTreeMap::new();
        let mut pool = TokenPool::new(&mut bounds, &mut slots);
        let mut seed = seed(42, 1000);
        claim_eq!(seed.incrementor, 43);

        let draws = [Draw {
            beneficiary: 1u8,
            count: 2,
        }];
        let first = allocate(&mut pool, Some(&mut seed), &draws, 0, 1)
            .expect_report("First draw failed");
        claim_eq!(ids(&first), vec![43]);
        claim_eq!(first.next_index, 1);

        let second = allocate(&mut pool, Some(&mut seed), &draws, first.next_index, 1)
            .expect_report("Second draw failed");
        // Position 85 of the 999 live ids, untouched by the first swap.
        claim_eq!(ids(&second), vec![86]);
        claim_eq!(pool.remaining(), 998);
    }

    #[concordium_test]
    fn test_swapped_slot_is_reoffered_with_last_id() {
        let mut bounds = PoolBounds::new(0, 10_000);
        let mut slots = BTreeMap::new();
        let mut pool = TokenPool::new(&mut bounds, &mut slots);

        let first = pool
            .draw_single(&RandomValue::from_u128(42))
            .expect_report("Draw failed");
        claim_eq!(first, TokenId(43));
        let second = pool
            .draw_single(&RandomValue::from_u128(42))
            .expect_report("Draw failed");
        claim_eq!(second, TokenId(10_000));
    }

    #[concordium_test]
    fn test_seed_wraps_modulo_pool_size() {
        let cases = [(20_049u128, 50u32), (0, 1), (9_999, 10_000), (10_000, 1)];
        for (value, expected) in cases.iter() {
            let mut bounds = PoolBounds::new(0, 10_000);
            let mut slots = BTreeMap::new();
            let mut pool = TokenPool::new(&mut bounds, &mut slots);
            let token = pool
                .draw_single(&RandomValue::from_u128(*value))
                .expect_report("Draw failed");
            claim_eq!(token, TokenId(*expected));
        }
    }

    #[concordium_test]
    fn test_last_position_resolves_to_upper_bound() {
        let mut bounds = PoolBounds::new(7_000, 8_000);
        let mut slots = BTreeMap::new();
        let mut pool = TokenPool::new(&mut bounds, &mut slots);
        let mut seed = seed(999, 1_000);
        let draws = [Draw {
            beneficiary: 0u8,
            count: 1,
        }];
        let allocation =
            allocate(&mut pool, Some(&mut seed), &draws, 0, 1).expect_report("Draw failed");
        claim_eq!(ids(&allocation), vec![8_000]);
        claim!(slots.is_empty());
    }

    #[concordium_test]
    fn test_wide_seed_reduces_exactly() {
        let value = RandomValue([0xff; 32]);
        // 2^256 - 1 = 9935 (mod 10000)
        claim_eq!(value.rem(NonZeroU32::new(10_000).expect_report("Non-zero")), 9_935);
        claim_eq!(value.rem(NonZeroU32::new(2).expect_report("Non-zero")), 1);
        claim_eq!(value.rem(NonZeroU32::new(1).expect_report("Non-zero")), 0);
    }

    #[concordium_test]
    fn test_uniqueness_and_exhaustion() {
        let bounds = PoolBounds::new(7_000, 8_000);
        let drawn = draw_all(bounds, seed(0x1234_5678_9abc_def0_u128 << 64, 1_000), 37);

        claim_eq!(drawn.len(), 1_000);
        let unique: BTreeSet<u32> = drawn.iter().copied().collect();
        claim_eq!(unique.len(), 1_000);
        claim!(drawn.iter().all(|id| *id > 7_000 && *id <= 8_000));
    }

    #[concordium_test]
    fn test_exhausted_pool_rejects_further_draws() {
        let mut bounds = PoolBounds::new(0, 3);
        let mut slots = BTreeMap::new();
        let mut pool = TokenPool::new(&mut bounds, &mut slots);
        let mut seed = seed(7, 3);
        let draws = [Draw {
            beneficiary: 0u8,
            count: 4,
        }];

        let allocation =
            allocate(&mut pool, Some(&mut seed), &draws, 0, 3).expect_report("Draw failed");
        claim_eq!(allocation.assigned.len(), 3);
        claim_eq!(pool.remaining(), 0);

        let result = allocate(&mut pool, Some(&mut seed), &draws, 3, 1);
        claim_eq!(result, Err(CustomContractError::ExhaustedPool));
        claim_eq!(
            pool.draw_single(&RandomValue::from_u128(1)),
            Err(CustomContractError::ExhaustedPool)
        );
    }

    #[concordium_test]
    fn test_oversized_request_is_rejected_without_draws() {
        let mut bounds = PoolBounds::new(0, 3);
        let mut slots = BTreeMap::new();
        let mut pool = TokenPool::new(&mut bounds, &mut slots);
        let mut seed = seed(5, 3);
        let draws = [Draw {
            beneficiary: 0u8,
            count: 5,
        }];

        let result = allocate(&mut pool, Some(&mut seed), &draws, 0, 5);
        claim_eq!(result, Err(CustomContractError::ExhaustedPool));
        claim_eq!(pool.remaining(), 3);
        claim_eq!(seed.steps, 0);
    }

    #[concordium_test]
    fn test_missing_seed() {
        let mut bounds = PoolBounds::new(0, 10);
        let mut slots = BTreeMap::new();
        let mut pool = TokenPool::new(&mut bounds, &mut slots);
        let draws = [Draw {
            beneficiary: 0u8,
            count: 1,
        }];
        let result = allocate(&mut pool, None, &draws, 0, 1);
        claim_eq!(result, Err(CustomContractError::RandomnessNotReady));
        claim_eq!(pool.remaining(), 10);
    }

    #[concordium_test]
    fn test_chunking_does_not_change_assignment() {
        let bounds = PoolBounds::new(1_000, 2_000);
        let value = 0xdead_beef_u128 * 1_000_003;

        let whole = draw_all(bounds, seed(value, 1_000), 1_000);
        let halves = draw_all(bounds, seed(value, 1_000), 500);
        let uneven = draw_all(bounds, seed(value, 1_000), 333);

        claim_eq!(whole, halves);
        claim_eq!(whole, uneven);
    }

    #[concordium_test]
    fn test_resume_inside_multi_draw_batch() {
        let mut bounds = PoolBounds::new(0, 100);
        let mut slots = BTreeMap::new();
        let mut pool = TokenPool::new(&mut bounds, &mut slots);
        let mut seed = seed(11, 100);
        let draws = [
            Draw {
                beneficiary: 1u8,
                count: 2,
            },
            Draw {
                beneficiary: 2u8,
                count: 3,
            },
        ];

        let allocation =
            allocate(&mut pool, Some(&mut seed), &draws, 1, 3).expect_report("Draw failed");
        let owners: Vec<u8> = allocation.assigned.iter().map(|(owner, _)| *owner).collect();
        claim_eq!(owners, vec![1, 2, 2]);
        claim_eq!(allocation.next_index, 4);

        let rest = allocate(&mut pool, Some(&mut seed), &draws, 4, 10).expect_report("Draw failed");
        claim_eq!(rest.assigned.len(), 1);
        claim_eq!(rest.next_index, 5);
        claim_eq!(pool.remaining(), 96);
    }

    #[concordium_test]
    fn test_single_id_pool() {
        for value in [0u128, 1, 2, 1_000_000].iter() {
            let drawn = draw_all(PoolBounds::new(41, 42), seed(*value, 1), 1);
            claim_eq!(drawn, vec![42]);
        }
    }

    #[concordium_test]
    fn test_two_id_pool() {
        for value in 0u128..8 {
            let mut drawn = draw_all(PoolBounds::new(10, 12), seed(value, 2), 1);
            drawn.sort_unstable();
            claim_eq!(drawn, vec![11, 12]);
        }
    }

    #[concordium_test]
    fn test_incrementor_derivation() {
        claim_eq!(smallest_prime_above(1_000), 1_009);
        claim_eq!(smallest_prime_above(200), 211);
        claim_eq!(smallest_prime_above(10_000), 10_007);
        claim_eq!(smallest_prime_above(1), 2);
        claim_eq!(smallest_prime_above(0), 2);

        claim_eq!(derive_incrementor(&RandomValue::from_u128(42), 1_000), 43);
        claim_eq!(derive_incrementor(&RandomValue::from_u128(43), 1_000), 43);
        // 10089 = 1008 (mod 1009), whose odd adjustment is the modulus itself.
        claim_eq!(derive_incrementor(&RandomValue::from_u128(10_089), 1_000), 1);
        // Slot of one id: modulus 2, seed 1 stays odd.
        claim_eq!(derive_incrementor(&RandomValue::from_u128(1), 1), 1);
        // Slot of two ids: modulus 3, seed 2 becomes 3 and falls back to 1.
        claim_eq!(derive_incrementor(&RandomValue::from_u128(2), 2), 1);
        for value in 0u128..2_000 {
            let step = derive_incrementor(&RandomValue::from_u128(value), 1_000);
            claim!(step % 2 == 1);
            claim!(step % 1_009 != 0);
        }
    }

    #[concordium_test]
    fn test_fallback_incrementor_still_exhausts_uniquely() {
        let drawn = draw_all(PoolBounds::new(0, 1_000), seed(10_089, 1_000), 250);
        let unique: BTreeSet<u32> = drawn.iter().copied().collect();
        claim_eq!(unique.len(), 1_000);
    }

    #[concordium_test]
    fn test_state_map_store_matches_btree_store() {
        let mut state_builder = TestStateBuilder::new();
        let mut state_slots: StateMap<u32, u32, _> = state_builder.new_map();
        let mut bounds = PoolBounds::new(0, 50);
        let mut pool = TokenPool::new(&mut bounds, &mut state_slots);
        let mut seed_state = seed(987_654_321, 50);
        let draws = [Draw {
            beneficiary: 0u8,
            count: 50,
        }];
        let allocation = allocate(&mut pool, Some(&mut seed_state), &draws, 0, 50)
            .expect_report("Draw failed");

        claim_eq!(ids(&allocation), draw_all(PoolBounds::new(0, 50), seed(987_654_321, 50), 7));
        claim!(state_slots.iter().next().is_none());
    }
}
