/// Step through a fixed option list. An unset value moves to the first
/// option going forward and the last going backward.
pub fn cycle<T: Copy + PartialEq>(options: &[T], current: Option<T>, forward: bool) -> Option<T> {
    if options.is_empty() {
        return current;
    }

    let position = current.and_then(|value| options.iter().position(|o| *o == value));
    let next = match (position, forward) {
        (None, true) => 0,
        (None, false) => options.len() - 1,
        (Some(i), true) => (i + 1) % options.len(),
        (Some(i), false) => (i + options.len() - 1) % options.len(),
    };

    Some(options[next])
}
