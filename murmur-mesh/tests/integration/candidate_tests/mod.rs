mod test_trickle_forwarding;
