use log::trace;

use crate::finder::find_frame;
use crate::layout::{Geometry, Word};
use crate::phys::PhysicalMemory;

/// Walk the table tree for `vaddr`, linking a fresh frame wherever a level
/// entry is zero, and return the data frame with the page brought in from
/// the backing store.
pub(crate) fn walk_to_frame<P: PhysicalMemory>(
    pm: &mut P,
    geometry: Geometry,
    vaddr: u64,
) -> u64 {
    let page = geometry.page_number(vaddr);
    let mut frame = 0u64;
    for level in 0..geometry.tables_depth() {
        let slot = frame * geometry.page_size() + geometry.level_index(vaddr, level);
        let entry = pm.read(slot);
        if entry == 0 {
            // The frame we stand on must survive the search untouched.
            let fresh = find_frame(pm, geometry, frame, page);
            debug_assert_ne!(fresh, 0, "frame finder handed out the root");
            pm.write(slot, fresh as Word);
            trace!("page {}: linked frame {} at level {}", page, fresh, level);
            frame = fresh;
        } else {
            frame = entry as u64;
        }
    }
    pm.restore(frame, page);
    frame
}
