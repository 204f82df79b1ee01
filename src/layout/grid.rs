use crate::config::GridConfig;
use crate::geometry::Point;

/// Default position for the node at `index` in adapter order:
/// column `index % columns`, row `index / columns`.
pub fn grid_position(index: usize, grid: &GridConfig) -> Point {
    let columns = grid.columns.max(1);
    let column = index % columns;
    let row = index / columns;
    Point::new(
        grid.origin_x + column as f32 * grid.column_spacing,
        grid.origin_y + row as f32 * grid.row_spacing,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_rows_left_to_right() {
        let grid = GridConfig::default();
        assert_eq!(grid_position(0, &grid), Point::new(40.0, 40.0));
        assert_eq!(grid_position(2, &grid), Point::new(520.0, 40.0));
        assert_eq!(grid_position(3, &grid), Point::new(40.0, 180.0));
    }

    #[test]
    fn zero_columns_degrades_to_single_column() {
        let grid = GridConfig {
            columns: 0,
            ..GridConfig::default()
        };
        assert_eq!(grid_position(2, &grid), Point::new(40.0, 320.0));
    }
}
