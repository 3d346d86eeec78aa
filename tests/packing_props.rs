use proptest::prelude::*;
use sovran_typearray::packing::{padding_for, plan};
use sovran_typearray::{RawArena, ARENA_ALIGN};
use std::alloc::Layout;

fn arb_layout() -> impl Strategy<Value = Layout> {
    (0u32..=6, 1usize..=4).prop_map(|(shift, multiple)| {
        let align = 1usize << shift;
        Layout::from_size_align(align * multiple, align).unwrap()
    })
}

fn arb_layouts() -> impl Strategy<Value = Vec<Layout>> {
    prop::collection::vec(arb_layout(), 0..=8)
}

proptest! {
    #[test]
    fn offsets_are_aligned_and_in_bounds(start in 0usize..256, layouts in arb_layouts()) {
        let result = plan(start, &layouts);
        prop_assert_eq!(result.offsets.len(), layouts.len());
        for (offset, layout) in result.offsets.iter().zip(&layouts) {
            prop_assert_eq!(offset % layout.align(), 0);
            prop_assert!(*offset >= start);
            prop_assert!(offset + layout.size() <= result.end);
        }
    }

    #[test]
    fn ranges_never_overlap(start in 0usize..256, layouts in arb_layouts()) {
        let result = plan(start, &layouts);
        let mut ranges: Vec<(usize, usize)> = result
            .offsets
            .iter()
            .zip(&layouts)
            .map(|(&offset, layout)| (offset, offset + layout.size()))
            .collect();
        ranges.sort_unstable();
        for pair in ranges.windows(2) {
            prop_assert!(pair[0].1 <= pair[1].0, "{:?} overlaps {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn plan_is_deterministic(start in 0usize..256, layouts in arb_layouts()) {
        prop_assert_eq!(plan(start, &layouts), plan(start, &layouts));
    }

    #[test]
    fn padding_accounts_for_every_byte(start in 0usize..256, layouts in arb_layouts()) {
        let result = plan(start, &layouts);
        let sizes: usize = layouts.iter().map(Layout::size).sum();
        prop_assert_eq!(result.end, start + sizes + result.padding(start, &layouts));
    }

    #[test]
    fn each_step_takes_the_cheapest_padding(start in 0usize..256, layouts in arb_layouts()) {
        let result = plan(start, &layouts);
        // Replay placements in address order; each must have needed no more
        // padding than any layout still waiting at that point.
        let mut order: Vec<usize> = (0..layouts.len()).collect();
        order.sort_by_key(|&i| result.offsets[i]);
        let mut end = start;
        for (step, &i) in order.iter().enumerate() {
            let paid = result.offsets[i] - end;
            for &waiting in &order[step..] {
                prop_assert!(paid <= padding_for(end, layouts[waiting].align()));
            }
            end = result.offsets[i] + layouts[i].size();
        }
        prop_assert_eq!(end, result.end);
    }

    #[test]
    fn arena_batches_stay_aligned(
        prefix in prop::collection::vec(arb_layout(), 0..4),
        batch in arb_layouts(),
    ) {
        let mut arena = RawArena::new();
        for layout in &prefix {
            arena.bump(*layout);
        }
        let start = arena.len();
        let offsets = arena.bump_batch(&batch);
        prop_assert_eq!(arena.len(), plan(start, &batch).end);
        prop_assert_eq!(arena.as_ptr() as usize % ARENA_ALIGN, 0);
        for (offset, layout) in offsets.iter().zip(&batch) {
            prop_assert_eq!((arena.as_ptr() as usize + offset) % layout.align(), 0);
        }
    }
}
