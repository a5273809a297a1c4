/// Negotiates a swap of __ASSETS__ assets between two parties.
///
/// Owner bits are `false` for party 0 and `true` for party 1. `deltas` lists every candidate
/// except the initial allocation, in enumeration order. Each candidate is scored and compared,
/// and the leader is always rewritten through a mux, so the circuit does not depend on the
/// valuations.
pub fn main(
    valuations_0: [i32; __ASSETS__],
    valuations_1: [i32; __ASSETS__],
) -> [bool; __ASSETS__] {
    let initial: [bool; __ASSETS__] = __INITIAL__;
    let deltas: [[bool; __ASSETS__]; __CANDIDATES__] = __DELTAS__;

    let mut leader: [bool; __ASSETS__] = initial;
    let mut leader_0: i64 = score_0(initial, valuations_0);
    let mut leader_1: i64 = score_1(initial, valuations_1);
    for delta in deltas {
        let mut candidate: [bool; __ASSETS__] = initial;
        for i in 0usize..__ASSETS__usize {
            candidate[i] = initial[i] ^ delta[i];
        }
        let candidate_0: i64 = score_0(candidate, valuations_0);
        let candidate_1: i64 = score_1(candidate, valuations_1);
        let accept: bool = (candidate_0 >= leader_0) & (candidate_1 >= leader_1);
        leader = if accept { candidate } else { leader };
        leader_0 = if accept { candidate_0 } else { leader_0 };
        leader_1 = if accept { candidate_1 } else { leader_1 };
    }
    leader
}

fn score_0(owners: [bool; __ASSETS__], valuations: [i32; __ASSETS__]) -> i64 {
    let mut total: i64 = 0i64;
    for i in 0usize..__ASSETS__usize {
        let value: i64 = if owners[i] { 0i64 } else { valuations[i] as i64 };
        total = total + value;
    }
    total
}

fn score_1(owners: [bool; __ASSETS__], valuations: [i32; __ASSETS__]) -> i64 {
    let mut total: i64 = 0i64;
    for i in 0usize..__ASSETS__usize {
        let value: i64 = if owners[i] { valuations[i] as i64 } else { 0i64 };
        total = total + value;
    }
    total
}
