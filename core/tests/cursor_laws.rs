use algorun_core::{Cursor, Direction, Turn};
use proptest::prelude::*;

fn direction() -> impl Strategy<Value = Direction> {
    prop::sample::select(Direction::ALL.to_vec())
}

proptest! {
    #[test]
    fn left_then_right_is_identity(start in direction()) {
        prop_assert_eq!(start.rotate(Turn::Left).rotate(Turn::Right), start);
        prop_assert_eq!(start.rotate(Turn::Right).rotate(Turn::Left), start);
    }

    #[test]
    fn four_turns_return_to_start(start in direction()) {
        let mut facing = start;
        for _ in 0..4 {
            facing = facing.rotate(Turn::Right);
        }
        prop_assert_eq!(facing, start);
    }

    #[test]
    fn moves_toward_origin_never_go_negative(x in 0_u32..1_000, y in 0_u32..1_000) {
        let mut up = Cursor::new(x, y, Direction::Up);
        up.move_forward();
        prop_assert_eq!((up.x(), up.y()), (x, y.saturating_sub(1)));

        let mut left = Cursor::new(x, y, Direction::Left);
        left.move_forward();
        prop_assert_eq!((left.x(), left.y()), (x.saturating_sub(1), y));
    }

    #[test]
    fn moves_away_from_origin_are_unbounded(x in 0_u32..1_000_000, y in 0_u32..1_000_000) {
        let mut down = Cursor::new(x, y, Direction::Down);
        down.move_forward();
        prop_assert_eq!((down.x(), down.y()), (x, y + 1));

        let mut right = Cursor::new(x, y, Direction::Right);
        right.move_forward();
        prop_assert_eq!((right.x(), right.y()), (x + 1, y));
    }

    #[test]
    fn rotation_keeps_position(x in 0_u32..64, y in 0_u32..64, start in direction()) {
        let mut cursor = Cursor::new(x, y, start);
        cursor.rotate(Turn::Left);
        prop_assert_eq!((cursor.x(), cursor.y()), (x, y));
        prop_assert_eq!(cursor.direction(), start.rotate(Turn::Left));
    }
}
