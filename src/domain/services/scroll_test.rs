use super::Scroll;

fn create_scroll() -> Scroll {
    let mut scroll = Scroll::default();
    scroll.set_state(30, 10);
    return scroll;
}

#[test]
fn it_stops_at_top() {
    let mut scroll = create_scroll();
    scroll.up();
    assert_eq!(scroll.position, 0);
}

#[test]
fn it_stops_at_bottom() {
    let mut scroll = create_scroll();
    for _ in 0..5 {
        scroll.down_page();
    }
    assert_eq!(scroll.position, 20);
}

#[test]
fn it_jumps_to_last() {
    let mut scroll = create_scroll();
    scroll.last();
    assert_eq!(scroll.position, 20);

    scroll.up_page();
    assert_eq!(scroll.position, 10);
}

#[test]
fn it_stays_put_when_content_fits() {
    let mut scroll = Scroll::default();
    scroll.set_state(5, 10);
    scroll.down();
    scroll.last();
    assert_eq!(scroll.position, 0);
}
