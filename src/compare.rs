use core::cmp::Ordering;

/// A three-way comparison used to order the elements of an [`AvlTree`](crate::AvlTree).
///
/// Implementations must describe a total order over the elements they are handed: the result
/// must be consistent between calls and transitive. Elements comparing [`Ordering::Equal`] are
/// permitted and are stored side by side. A comparator that breaks this contract leaves the tree
/// in an unspecified (but memory-safe) shape.
///
/// Every closure or function of type `Fn(&T, &T) -> Ordering` is a comparator.
pub trait Comparator<T: ?Sized> {
    fn compare(&self, a: &T, b: &T) -> Ordering;
}

impl<T, F> Comparator<T> for F
where
    T: ?Sized,
    F: Fn(&T, &T) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        self(a, b)
    }
}

/// Orders elements by their [`Ord`] implementation.
#[derive(Copy, Clone, Debug, Default)]
pub struct Natural;

impl<T: Ord + ?Sized> Comparator<T> for Natural {
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        a.cmp(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_compare() {
        let reverse = |a: &u32, b: &u32| b.cmp(a);

        assert_eq!(reverse.compare(&1, &2), Ordering::Greater);
        assert_eq!(reverse.compare(&2, &2), Ordering::Equal);
    }

    #[test]
    fn natural_order() {
        assert_eq!(Natural.compare(&1, &2), Ordering::Less);
        assert_eq!(Natural.compare("b", "a"), Ordering::Greater);
    }
}
