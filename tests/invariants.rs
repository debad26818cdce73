// Random sessions over random catalogs: after every mutation the state is
// pruned, the year range sits inside the available years, and recompute is a no-op.

use maint_assign::{
    compute_availability, matches, Catalog, Facet, FilterSession, VehicleRecord, YearRange,
};
use proptest::prelude::*;

const POOLS: [&[&str]; 6] = [
    &["Ford", "Toyota", "Škoda", "Citroën"],
    &["F150", "Corolla", "Octavia", "C3"],
    &["V8", "V6", "I4"],
    &["AUTO", "MAN", "CVT"],
    &["4WD", "FWD"],
    &["GAS", "DIESEL", ""],
];

#[derive(Debug, Clone)]
enum Op {
    Toggle(Facet, String),
    SelectOnly(Facet, Vec<String>),
    Clear(Facet),
    SetFrom(Option<i32>),
    SetTo(Option<i32>),
    Reset,
}

fn arb_facet() -> impl Strategy<Value = Facet> {
    (0..Facet::ALL.len()).prop_map(|i| Facet::ALL[i])
}

fn arb_value(facet: Facet) -> impl Strategy<Value = String> {
    let pool = POOLS[facet.index()];
    (0..pool.len()).prop_map(move |i| pool[i].to_string())
}

fn arb_year() -> impl Strategy<Value = Option<i32>> {
    prop_oneof![Just(None), (2012..2028).prop_map(Some)]
}

fn arb_vehicle() -> impl Strategy<Value = VehicleRecord> {
    (
        2015..2025,
        arb_value(Facet::Make),
        arb_value(Facet::Model),
        arb_value(Facet::Engine),
        arb_value(Facet::Transmission),
        arb_value(Facet::Drivetrain),
        arb_value(Facet::Fuel),
    )
        .prop_map(|(year, make, model, engine, transmission, drivetrain, fuel)| VehicleRecord {
            id: String::new(),
            year: Some(year),
            make,
            model,
            engine,
            transmission,
            drivetrain,
            fuel,
        })
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => arb_facet().prop_flat_map(|f| arb_value(f).prop_map(move |v| Op::Toggle(f, v))),
        1 => arb_facet().prop_flat_map(|f| {
            prop::collection::vec(arb_value(f), 0..3).prop_map(move |vs| Op::SelectOnly(f, vs))
        }),
        1 => arb_facet().prop_map(Op::Clear),
        1 => arb_year().prop_map(Op::SetFrom),
        1 => arb_year().prop_map(Op::SetTo),
        1 => Just(Op::Reset),
    ]
}

fn apply(session: &mut FilterSession, op: &Op) {
    match op {
        Op::Toggle(facet, value) => {
            session.toggle(*facet, value);
        }
        Op::SelectOnly(facet, values) => session.select_only(*facet, values.iter().cloned()),
        Op::Clear(facet) => session.clear(*facet),
        Op::SetFrom(year) => session.set_year_from(*year),
        Op::SetTo(year) => session.set_year_to(*year),
        Op::Reset => session.reset(),
    }
}

fn check_invariants(session: &FilterSession) -> Result<(), TestCaseError> {
    let state = session.state();
    let availability = session.availability();

    // stored availability is the one derived from the current state
    prop_assert_eq!(availability, &compute_availability(session.catalog(), state));

    for facet in Facet::ALL {
        for value in state.selection.get(facet) {
            prop_assert!(
                availability.contains(facet, value),
                "{:?} keeps unavailable value {:?}",
                facet,
                value
            );
        }
    }

    match availability.year_bounds() {
        Some((min, max)) => {
            let (Some(from), Some(to)) = (state.years.from, state.years.to) else {
                return Err(TestCaseError::fail("year bounds left open"));
            };
            prop_assert!(min <= from && from <= to && to <= max, "{}..{} outside {}..{}", from, to, min, max);
        }
        None => prop_assert_eq!(state.years, YearRange::default()),
    }

    let expected = session
        .catalog()
        .vehicles()
        .iter()
        .filter(|v| matches(v, state))
        .count();
    prop_assert_eq!(session.match_count(), expected);

    let mut again = session.clone();
    prop_assert_eq!(again.recompute(), 1);
    prop_assert_eq!(again.state(), state);

    Ok(())
}

proptest! {
    #[test]
    fn session_invariants_hold_after_every_mutation(
        vehicles in prop::collection::vec(arb_vehicle(), 0..24),
        ops in prop::collection::vec(arb_op(), 1..16),
    ) {
        let mut session = FilterSession::new(Catalog::new(vehicles));
        check_invariants(&session)?;

        for op in &ops {
            apply(&mut session, op);
            check_invariants(&session)?;
        }
    }
}
