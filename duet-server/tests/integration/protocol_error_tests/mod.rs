pub mod test_join_from_unregistered_connection_is_rejected;
pub mod test_second_join_is_already_joined_even_for_same_room;
