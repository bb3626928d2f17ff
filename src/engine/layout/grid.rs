use eframe::egui::{Pos2, Rect, pos2, vec2};
use rand::rngs::StdRng;

use super::{LayoutStrategy, Scene, Subject};

/// Columns and rows of the most nearly square grid holding `count` cells.
fn grid_shape(count: usize) -> (usize, usize) {
    let count = count.max(1);
    let columns = (count as f32).sqrt().ceil() as usize;
    let rows = count.div_ceil(columns);
    (columns, rows)
}

fn cell_center(area: Rect, columns: usize, rows: usize, index: usize) -> Pos2 {
    let cell = vec2(area.width() / columns as f32, area.height() / rows as f32);
    let column = index % columns;
    let row = (index / columns) % rows;
    pos2(
        area.left() + cell.x * (column as f32 + 0.5),
        area.top() + cell.y * (row as f32 + 0.5),
    )
}

pub struct GridLayout;

impl LayoutStrategy for GridLayout {
    fn place(&self, subject: &Subject, scene: &Scene<'_>, _rng: &mut StdRng) -> Pos2 {
        let (columns, rows) = grid_shape(scene.capacity.max(scene.live_count));
        cell_center(scene.usable_rect(), columns, rows, subject.slot)
    }
}

/// Clusters by category on a coarse grid, then lays each cluster out on its
/// own fine grid.
pub struct HierarchicalLayout;

impl LayoutStrategy for HierarchicalLayout {
    fn place(&self, subject: &Subject, scene: &Scene<'_>, _rng: &mut StdRng) -> Pos2 {
        let usable = scene.usable_rect();
        let (columns, rows) = grid_shape(scene.cluster_count);
        let cluster_cell = vec2(usable.width() / columns as f32, usable.height() / rows as f32);
        let cluster_center = cell_center(usable, columns, rows, subject.cluster);
        let cluster_area = Rect::from_center_size(cluster_center, cluster_cell)
            .shrink(scene.min_spacing.min(cluster_cell.min_elem() * 0.25));

        let (inner_columns, inner_rows) = grid_shape(subject.cluster_size);
        cell_center(cluster_area, inner_columns, inner_rows, subject.cluster_slot)
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;
    use rand::SeedableRng;

    use super::super::test_support::{scene, subject};
    use super::*;

    #[test]
    fn nine_slots_form_three_by_three() {
        let scene = scene(vec2(900.0, 900.0), 9, 9);
        let mut rng = StdRng::seed_from_u64(0);
        let radius = crate::engine::bubble::max_radius_for(scene.canvas, 9, 16.0, 8.0);
        let targets = (0..9)
            .map(|slot| GridLayout.place(&subject(slot, radius), &scene, &mut rng))
            .collect::<Vec<_>>();

        let mut xs = targets.iter().map(|p| p.x.round() as i32).collect::<Vec<_>>();
        let mut ys = targets.iter().map(|p| p.y.round() as i32).collect::<Vec<_>>();
        xs.sort_unstable();
        xs.dedup();
        ys.sort_unstable();
        ys.dedup();
        assert_eq!(xs.len(), 3);
        assert_eq!(ys.len(), 3);

        for (i, a) in targets.iter().enumerate() {
            for b in &targets[i + 1..] {
                assert!(a.distance(*b) >= radius * 2.0 + scene.min_spacing);
            }
        }
    }

    #[test]
    fn grid_is_row_major() {
        let scene = scene(vec2(300.0, 300.0), 4, 4);
        let mut rng = StdRng::seed_from_u64(0);
        let first = GridLayout.place(&subject(0, 10.0), &scene, &mut rng);
        let second = GridLayout.place(&subject(1, 10.0), &scene, &mut rng);
        let third = GridLayout.place(&subject(2, 10.0), &scene, &mut rng);
        assert_eq!(first.y, second.y);
        assert!(second.x > first.x);
        assert!(third.y > first.y);
        assert_eq!(third.x, first.x);
    }

    #[test]
    fn cluster_members_stay_in_their_cluster_cell() {
        let scene = Scene {
            cluster_count: 4,
            ..scene(vec2(800.0, 800.0), 16, 16)
        };
        let mut rng = StdRng::seed_from_u64(0);
        let usable = scene.usable_rect();
        for cluster in 0..4 {
            for slot in 0..4 {
                let member = Subject {
                    cluster,
                    cluster_slot: slot,
                    cluster_size: 4,
                    ..subject(cluster * 4 + slot, 20.0)
                };
                let target = HierarchicalLayout.place(&member, &scene, &mut rng);
                let column = ((target.x - usable.left()) / (usable.width() / 2.0)) as usize;
                let row = ((target.y - usable.top()) / (usable.height() / 2.0)) as usize;
                assert_eq!(row * 2 + column, cluster);
            }
        }
    }
}
