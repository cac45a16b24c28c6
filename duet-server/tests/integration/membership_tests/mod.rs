pub mod test_first_joiner_gets_empty_peer_list;
pub mod test_third_joiner_gets_room_full_and_membership_is_unchanged;
