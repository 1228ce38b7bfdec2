use mirror_fs::{ContentDigest, RelativePath, fingerprint_reader};
use proptest::prelude::*;

proptest! {
    #[test]
    fn digest_is_independent_of_chunk_size(
        data in proptest::collection::vec(any::<u8>(), 0..32 * 1024),
        chunk in 1usize..16 * 1024,
    ) {
        let streamed = fingerprint_reader(&data[..], chunk).unwrap();
        prop_assert_eq!(streamed, ContentDigest::of_bytes(&data));
    }

    #[test]
    fn single_byte_change_changes_digest(
        data in proptest::collection::vec(any::<u8>(), 1..4096),
        index in any::<prop::sample::Index>(),
        flip in 1u8..=255,
    ) {
        let mut changed = data.clone();
        let i = index.index(changed.len());
        changed[i] ^= flip;
        prop_assert_ne!(ContentDigest::of_bytes(&data), ContentDigest::of_bytes(&changed));
    }

    #[test]
    fn relative_path_roundtrips_through_slash_form(
        segments in proptest::collection::vec("[a-zA-Z0-9_.-]{1,12}", 1..6),
    ) {
        prop_assume!(segments.iter().all(|s| s != "." && s != ".."));
        let joined = segments.join("/");
        let path = RelativePath::new(&joined).unwrap();

        prop_assert_eq!(path.to_string(), joined.clone());
        prop_assert_eq!(path.depth(), segments.len());
        prop_assert_eq!(RelativePath::new(path.to_string()), Some(path));
    }
}
